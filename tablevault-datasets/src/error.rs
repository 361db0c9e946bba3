//! Error types for the datasets module.

use serde::Serialize;
use thiserror::Error;

/// All errors that can occur in dataset operations.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Bad input shape or type. Caller-fixable; carries every violation
    /// found, not just the first. Raised before any encryption work.
    #[error("validation failed: {0}")]
    Validation(Violations),

    /// Key-authority or cryptographic failure during a write. The whole
    /// write is aborted; nothing was persisted.
    #[error("encryption failed: {0}")]
    Encryption(#[from] tablevault_crypto::CryptoError),

    #[error("dataset not found: {0}")]
    NotFound(String),

    #[error("invalid dataset id: {0}")]
    InvalidId(String),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// A single validation problem, addressed by column and row.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub column: String,
    /// Zero-based row index, when the problem is a specific value.
    pub row: Option<usize>,
    /// The offending value, when there is one.
    pub value: Option<serde_json::Value>,
    pub reason: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "column {:?}", self.column)?;
        if let Some(row) = self.row {
            write!(f, ", row {row}")?;
        }
        if let Some(value) = &self.value {
            write!(f, ", value {value}")?;
        }
        write!(f, ": {}", self.reason)
    }
}

/// Every violation found in one write request.
#[derive(Debug, Clone, Serialize)]
pub struct Violations(pub Vec<Violation>);

impl std::fmt::Display for Violations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join("; "))
    }
}
