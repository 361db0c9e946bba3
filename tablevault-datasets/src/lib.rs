//! Encrypted tabular dataset storage for Tablevault.
//!
//! Every column's value sequence is persisted only in envelope-encrypted
//! form: the ciphertext, nonce, authentication tag and wrapped data key
//! live in the column row; plaintext exists only in memory, on the way in
//! (write orchestration) and on the way out (read interception).
//!
//! # Architecture
//!
//! - [`DatasetStore`] is blob-agnostic CRUD over DuckDB. It never touches
//!   a key.
//! - [`DatasetService`] orchestrates writes (validate all, encrypt all,
//!   persist all, or nothing) and applies the [`Reveal`] interception to
//!   every read before it leaves the crate.
//! - Column metadata (name, declared type, ordinal position, date format
//!   hint) is stored in clear; only the value sequences are encrypted.

mod error;
mod intercept;
mod schema;
mod service;
mod store;
mod types;
mod validate;

pub use error::{DatasetError, DatasetResult, Violation, Violations};
pub use intercept::Reveal;
pub use schema::initialize_datasets_schema;
pub use service::DatasetService;
pub use store::DatasetStore;
pub use types::{
    ColumnInput, ColumnType, DataColumn, Dataset, DatasetId, DatasetMeta, EncryptedColumnRecord,
    SealedColumn, SealedDataset,
};
pub use validate::{
    validate_row_counts, validate_types, validate_unique_indices, validate_unique_names,
};

/// Open a DuckDB connection for the datasets database with WAL recovery.
///
/// If the initial open fails and a `.wal` file exists alongside the
/// database, it is removed and the open is retried once. This handles an
/// unclean shutdown leaving a WAL file that prevents reopening.
pub fn open_datasets_db(path: &std::path::Path) -> DatasetResult<duckdb::Connection> {
    match duckdb::Connection::open(path) {
        Ok(conn) => Ok(conn),
        Err(first_err) => {
            let wal_path = path.with_extension(
                path.extension()
                    .map(|ext| format!("{}.wal", ext.to_string_lossy()))
                    .unwrap_or_else(|| "wal".to_string()),
            );
            if wal_path.exists() {
                eprintln!(
                    "[WARN] DuckDB datasets open failed, removing stale WAL and retrying: {}",
                    wal_path.display()
                );
                if std::fs::remove_file(&wal_path).is_ok() {
                    return duckdb::Connection::open(path).map_err(Into::into);
                }
            }
            Err(first_err.into())
        }
    }
}
