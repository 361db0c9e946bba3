//! DDL and schema helpers for the datasets database.

use crate::error::DatasetResult;
use duckdb::Connection;

/// Metadata table DDL — one row per dataset.
const DATASETS_META_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS _datasets_meta (
    id VARCHAR PRIMARY KEY,
    name VARCHAR NOT NULL,
    row_count BIGINT NOT NULL DEFAULT 0,
    column_count BIGINT NOT NULL DEFAULT 0,
    created_at BIGINT NOT NULL,
    modified_at BIGINT NOT NULL
);
"#;

/// Column table DDL — clear metadata plus the four envelope blobs.
/// The blobs are written once per row; re-keying a column always creates a
/// new row rather than mutating these fields in place.
///
/// Ordinal uniqueness per dataset is enforced at write time, not by an
/// index: DuckDB's ART indexes reject delete-then-reinsert of the same key
/// inside one transaction, which the full-swap update path relies on.
const DATASET_COLUMNS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS _dataset_columns (
    id VARCHAR PRIMARY KEY,
    dataset_id VARCHAR NOT NULL,
    name VARCHAR NOT NULL,
    column_type VARCHAR NOT NULL,
    ordinal INTEGER NOT NULL,
    date_format VARCHAR,
    ciphertext TEXT NOT NULL,
    nonce TEXT NOT NULL,
    auth_tag TEXT NOT NULL,
    wrapped_key TEXT NOT NULL,
    created_at BIGINT NOT NULL
);
"#;

/// Initialize all dataset schema tables.
pub fn initialize_datasets_schema(conn: &Connection) -> DatasetResult<()> {
    conn.execute_batch(DATASETS_META_DDL)?;
    conn.execute_batch(DATASET_COLUMNS_DDL)?;
    Ok(())
}
