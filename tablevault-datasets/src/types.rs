//! Core data types for encrypted dataset storage.
//!
//! Column shapes come in a sealed and a plain variant. [`SealedColumn`] is
//! what storage returns: clear metadata plus the envelope blobs, and no
//! `data` field at all. [`DataColumn`] is what collaborators see: a
//! plaintext `data` vector and no envelope fields. The split makes it a
//! compile error for ciphertext to appear in a response shape.

use serde::{Deserialize, Serialize};
use tablevault_crypto::Envelope;
use uuid::Uuid;

/// Strongly-typed dataset identifier (NewType pattern).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub Uuid);

impl DatasetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declared column value type. Drives write-time validation; never
/// re-derived from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Number,
    String,
    Date,
}

impl ColumnType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Date => "date",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "number" => Self::Number,
            "date" => Self::Date,
            _ => Self::String,
        }
    }
}

/// One column of a write request, carrying its plaintext value sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInput {
    pub name: String,
    pub column_type: ColumnType,
    /// Zero-based ordinal position within the dataset.
    pub index: i32,
    /// Display format hint; only meaningful for date columns.
    pub date_format: Option<String>,
    pub data: Vec<serde_json::Value>,
}

/// Clear column metadata plus its encrypted payload, as handed to the
/// store by the write path. Row ids are assigned at insert time.
#[derive(Debug, Clone)]
pub struct EncryptedColumnRecord {
    pub name: String,
    pub column_type: ColumnType,
    pub index: i32,
    pub date_format: Option<String>,
    pub envelope: Envelope,
}

/// A column row exactly as stored. Deliberately not serializable: sealed
/// shapes must be revealed before anything leaves this crate.
#[derive(Debug, Clone)]
pub struct SealedColumn {
    pub id: String,
    pub dataset_id: DatasetId,
    pub name: String,
    pub column_type: ColumnType,
    pub index: i32,
    pub date_format: Option<String>,
    pub envelope: Envelope,
}

/// A column as collaborators see it: decrypted `data`, no envelope fields.
#[derive(Debug, Clone, Serialize)]
pub struct DataColumn {
    pub id: String,
    pub dataset_id: DatasetId,
    pub name: String,
    pub column_type: ColumnType,
    pub index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    /// The ordered value sequence. Materialized on read, never persisted.
    pub data: Vec<serde_json::Value>,
}

/// Metadata for a stored dataset. Timestamps are epoch millis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub id: DatasetId,
    pub name: String,
    pub row_count: i64,
    pub column_count: i64,
    pub created_at: i64,
    pub modified_at: i64,
}

/// A dataset read straight from storage, columns still sealed.
#[derive(Debug, Clone)]
pub struct SealedDataset {
    pub meta: DatasetMeta,
    pub columns: Vec<SealedColumn>,
}

/// A fully decrypted dataset: the only read shape collaborators see.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    #[serde(flatten)]
    pub meta: DatasetMeta,
    /// Columns ordered by `index` ascending.
    pub columns: Vec<DataColumn>,
}
