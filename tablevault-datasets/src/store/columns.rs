//! Column row operations: create, replace, read.
//!
//! Multi-row writes run inside a single transaction so a dataset never
//! ends up with a partial column set.

use super::{finish_transaction, now_millis, DatasetStore};
use crate::error::{DatasetError, DatasetResult};
use crate::types::{
    ColumnType, DatasetId, DatasetMeta, EncryptedColumnRecord, SealedColumn, SealedDataset,
};
use duckdb::{params, Connection};
use tablevault_crypto::Envelope;
use uuid::Uuid;

impl DatasetStore {
    /// Insert a dataset's meta row together with all of its column rows.
    /// One transaction; nothing is committed if any insert fails.
    pub fn create_dataset(
        &self,
        meta: &DatasetMeta,
        records: &[EncryptedColumnRecord],
    ) -> DatasetResult<()> {
        let conn = self.lock_conn();
        conn.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> DatasetResult<()> {
            conn.execute(
                r#"INSERT INTO _datasets_meta (id, name, row_count, column_count, created_at, modified_at)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
                params![
                    meta.id.to_string(),
                    meta.name,
                    meta.row_count,
                    meta.column_count,
                    meta.created_at,
                    meta.modified_at,
                ],
            )?;
            insert_columns(&conn, &meta.id, records, meta.created_at)
        })();
        finish_transaction(&conn, result)
    }

    /// Insert all column rows for an existing dataset in one transaction.
    pub fn create_columns(
        &self,
        dataset_id: &DatasetId,
        records: &[EncryptedColumnRecord],
    ) -> DatasetResult<()> {
        let now = now_millis();
        let conn = self.lock_conn();
        conn.execute_batch("BEGIN TRANSACTION")?;
        let result = insert_columns(&conn, dataset_id, records, now);
        finish_transaction(&conn, result)
    }

    /// Swap a dataset's column set: delete every existing row, insert the
    /// new set, refresh the meta counters. One transaction; a full
    /// replacement, never a partial patch.
    pub fn replace_columns(
        &self,
        dataset_id: &DatasetId,
        records: &[EncryptedColumnRecord],
        row_count: i64,
    ) -> DatasetResult<()> {
        let now = now_millis();
        let conn = self.lock_conn();
        conn.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> DatasetResult<()> {
            conn.execute(
                "DELETE FROM _dataset_columns WHERE dataset_id = ?",
                params![dataset_id.to_string()],
            )?;
            insert_columns(&conn, dataset_id, records, now)?;
            let updated = conn.execute(
                "UPDATE _datasets_meta SET row_count = ?, column_count = ?, modified_at = ? WHERE id = ?",
                params![row_count, records.len() as i64, now, dataset_id.to_string()],
            )?;
            if updated == 0 {
                return Err(DatasetError::NotFound(dataset_id.to_string()));
            }
            Ok(())
        })();
        finish_transaction(&conn, result)
    }

    /// Read a dataset's column rows, sealed, ordered by ordinal ascending.
    pub fn read_columns(&self, dataset_id: &DatasetId) -> DatasetResult<Vec<SealedColumn>> {
        let conn = self.lock_conn();
        read_columns_inner(&conn, dataset_id)
    }

    /// Read a dataset's meta row together with its sealed columns.
    pub fn read_dataset(&self, dataset_id: &DatasetId) -> DatasetResult<SealedDataset> {
        let meta = self.get_meta(dataset_id)?;
        let columns = self.read_columns(dataset_id)?;
        Ok(SealedDataset { meta, columns })
    }
}

fn insert_columns(
    conn: &Connection,
    dataset_id: &DatasetId,
    records: &[EncryptedColumnRecord],
    now: i64,
) -> DatasetResult<()> {
    for record in records {
        conn.execute(
            r#"INSERT INTO _dataset_columns
               (id, dataset_id, name, column_type, ordinal, date_format,
                ciphertext, nonce, auth_tag, wrapped_key, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                Uuid::new_v4().to_string(),
                dataset_id.to_string(),
                record.name,
                record.column_type.as_str(),
                record.index,
                record.date_format,
                record.envelope.ciphertext,
                record.envelope.nonce,
                record.envelope.auth_tag,
                record.envelope.wrapped_key,
                now,
            ],
        )?;
    }
    Ok(())
}

fn read_columns_inner(conn: &Connection, dataset_id: &DatasetId) -> DatasetResult<Vec<SealedColumn>> {
    let mut stmt = conn.prepare(
        r#"SELECT id, name, column_type, ordinal, date_format,
                  ciphertext, nonce, auth_tag, wrapped_key
           FROM _dataset_columns WHERE dataset_id = ? ORDER BY ordinal ASC"#,
    )?;

    let columns = stmt
        .query_map(params![dataset_id.to_string()], |row| {
            Ok(SealedColumn {
                id: row.get::<_, String>(0)?,
                dataset_id: dataset_id.clone(),
                name: row.get::<_, String>(1)?,
                column_type: ColumnType::from_str(&row.get::<_, String>(2)?),
                index: row.get::<_, i32>(3)?,
                date_format: row.get::<_, Option<String>>(4)?,
                envelope: Envelope {
                    ciphertext: row.get::<_, String>(5)?,
                    nonce: row.get::<_, String>(6)?,
                    auth_tag: row.get::<_, String>(7)?,
                    wrapped_key: row.get::<_, String>(8)?,
                },
            })
        })?
        .filter_map(|r| r.ok())
        .collect();

    Ok(columns)
}
