//! Encrypted column store — thread-safe DuckDB wrapper.
//!
//! The store is blob-agnostic: it persists and returns envelope fields as
//! opaque strings and contains no cryptographic logic.

mod columns;
mod crud;

use crate::error::{DatasetError, DatasetResult};
use crate::schema::initialize_datasets_schema;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Thread-safe store for encrypted dataset columns backed by DuckDB.
#[derive(Clone)]
pub struct DatasetStore {
    conn: Arc<Mutex<Connection>>,
}

impl DatasetStore {
    /// Open (or create) the datasets database at the given path.
    pub fn open(path: &Path) -> DatasetResult<Self> {
        let conn = crate::open_datasets_db(path)?;
        initialize_datasets_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory datasets database (for testing).
    pub fn open_in_memory() -> DatasetResult<Self> {
        let conn = Connection::open_in_memory().map_err(DatasetError::DuckDb)?;
        initialize_datasets_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Acquire the connection lock, recovering from poison if a prior
    /// `catch_unwind` caught a DuckDB panic while the lock was held.
    pub(crate) fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            eprintln!("[DatasetStore] recovering from poisoned mutex");
            poisoned.into_inner()
        })
    }
}

/// Commit on success, roll back on failure, preserving the original error.
pub(crate) fn finish_transaction(conn: &Connection, result: DatasetResult<()>) -> DatasetResult<()> {
    match result {
        Ok(()) => {
            conn.execute_batch("COMMIT")?;
            Ok(())
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

/// Current time in milliseconds since Unix epoch.
pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
