//! Dataset metadata operations: get, list, delete, rename.

use super::{finish_transaction, now_millis, DatasetStore};
use crate::error::{DatasetError, DatasetResult};
use crate::types::{DatasetId, DatasetMeta};
use duckdb::params;
use tracing::info;

impl DatasetStore {
    /// Get a single dataset's metadata by ID.
    pub fn get_meta(&self, id: &DatasetId) -> DatasetResult<DatasetMeta> {
        let conn = self.lock_conn();
        let result = conn.query_row(
            "SELECT name, row_count, column_count, created_at, modified_at FROM _datasets_meta WHERE id = ?",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        );

        match result {
            Ok((name, row_count, column_count, created, modified)) => Ok(DatasetMeta {
                id: id.clone(),
                name,
                row_count,
                column_count,
                created_at: created,
                modified_at: modified,
            }),
            Err(duckdb::Error::QueryReturnedNoRows) => Err(DatasetError::NotFound(id.to_string())),
            Err(e) => Err(DatasetError::DuckDb(e)),
        }
    }

    /// List all datasets, most recently modified first.
    pub fn list(&self) -> DatasetResult<Vec<DatasetMeta>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, row_count, column_count, created_at, modified_at FROM _datasets_meta ORDER BY modified_at DESC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })?
            .filter_map(|r| r.ok())
            .collect::<Vec<_>>();

        drop(stmt);
        drop(conn);

        rows.into_iter()
            .map(|(id, name, row_count, column_count, created, modified)| {
                Ok(DatasetMeta {
                    id: DatasetId::parse(&id).map_err(|e| {
                        DatasetError::InvalidId(format!("{id}: {e}"))
                    })?,
                    name,
                    row_count,
                    column_count,
                    created_at: created,
                    modified_at: modified,
                })
            })
            .collect()
    }

    /// Delete a dataset and all of its column rows in one transaction.
    pub fn delete(&self, id: &DatasetId) -> DatasetResult<()> {
        let conn = self.lock_conn();
        conn.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> DatasetResult<()> {
            conn.execute(
                "DELETE FROM _dataset_columns WHERE dataset_id = ?",
                params![id.to_string()],
            )?;
            let deleted = conn.execute(
                "DELETE FROM _datasets_meta WHERE id = ?",
                params![id.to_string()],
            )?;
            if deleted == 0 {
                return Err(DatasetError::NotFound(id.to_string()));
            }
            Ok(())
        })();
        finish_transaction(&conn, result)?;

        info!(dataset_id = %id, "Dataset deleted");
        Ok(())
    }

    /// Rename a dataset.
    pub fn rename(&self, id: &DatasetId, new_name: &str) -> DatasetResult<()> {
        let now = now_millis();
        let conn = self.lock_conn();
        let updated = conn.execute(
            "UPDATE _datasets_meta SET name = ?, modified_at = ? WHERE id = ?",
            params![new_name, now, id.to_string()],
        )?;

        if updated == 0 {
            return Err(DatasetError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
