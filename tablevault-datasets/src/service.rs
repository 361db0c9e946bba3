//! Dataset write orchestration and the public read surface.
//!
//! A write is one logical unit: validate every column, encrypt every
//! column, persist everything in one transaction. If any step fails,
//! nothing is stored. Reads come back sealed from the store and are
//! revealed here, at the call site, before results reach collaborators.

use crate::error::{DatasetError, DatasetResult, Violation, Violations};
use crate::intercept::Reveal;
use crate::store::{now_millis, DatasetStore};
use crate::types::{ColumnInput, Dataset, DatasetId, DatasetMeta, EncryptedColumnRecord};
use crate::validate;
use tablevault_crypto::EnvelopeCrypto;
use tracing::info;

/// Public entry point for dataset reads and writes. Collaborators consume
/// this and never learn that columns are stored encrypted.
#[derive(Clone)]
pub struct DatasetService {
    store: DatasetStore,
    crypto: EnvelopeCrypto,
}

impl DatasetService {
    pub fn new(store: DatasetStore, crypto: EnvelopeCrypto) -> Self {
        Self { store, crypto }
    }

    /// Validate, encrypt and persist a new dataset, returning it decrypted.
    pub fn create_dataset(&self, name: &str, columns: &[ColumnInput]) -> DatasetResult<Dataset> {
        validate_all(columns)?;
        let records = self.encrypt_columns(columns)?;

        let now = now_millis();
        let meta = DatasetMeta {
            id: DatasetId::new(),
            name: name.to_string(),
            row_count: columns[0].data.len() as i64,
            column_count: columns.len() as i64,
            created_at: now,
            modified_at: now,
        };
        self.store.create_dataset(&meta, &records)?;

        info!(
            dataset_id = %meta.id,
            name,
            row_count = meta.row_count,
            column_count = meta.column_count,
            "Dataset created"
        );
        self.get_dataset(&meta.id)
    }

    /// Replace a dataset's entire column set with a freshly validated and
    /// encrypted one. Full swap; old rows and their envelopes are gone.
    pub fn update_dataset(&self, id: &DatasetId, columns: &[ColumnInput]) -> DatasetResult<Dataset> {
        validate_all(columns)?;
        let records = self.encrypt_columns(columns)?;

        let row_count = columns[0].data.len() as i64;
        self.store.replace_columns(id, &records, row_count)?;

        info!(
            dataset_id = %id,
            row_count,
            column_count = records.len(),
            "Dataset columns replaced"
        );
        self.get_dataset(id)
    }

    /// Read a dataset with plaintext `data` on every column.
    pub fn get_dataset(&self, id: &DatasetId) -> DatasetResult<Dataset> {
        let sealed = self.store.read_dataset(id)?;
        Ok(sealed.reveal(&self.crypto))
    }

    /// List all datasets, most recently modified first.
    pub fn list_datasets(&self) -> DatasetResult<Vec<DatasetMeta>> {
        self.store.list()
    }

    /// Delete a dataset together with all of its column rows.
    pub fn delete_dataset(&self, id: &DatasetId) -> DatasetResult<()> {
        self.store.delete(id)
    }

    /// Rename a dataset without touching its columns.
    pub fn rename_dataset(&self, id: &DatasetId, new_name: &str) -> DatasetResult<()> {
        self.store.rename(id, new_name)
    }

    /// Serialize one column's value sequence to canonical JSON and seal it.
    pub fn encrypt_column(&self, column: &ColumnInput) -> DatasetResult<EncryptedColumnRecord> {
        let payload = serde_json::to_string(&column.data)?;
        let envelope = self.crypto.encrypt(&payload)?;
        Ok(EncryptedColumnRecord {
            name: column.name.clone(),
            column_type: column.column_type,
            index: column.index,
            date_format: column.date_format.clone(),
            envelope,
        })
    }

    fn encrypt_columns(&self, columns: &[ColumnInput]) -> DatasetResult<Vec<EncryptedColumnRecord>> {
        columns.iter().map(|c| self.encrypt_column(c)).collect()
    }
}

/// Run every validation and reject with the full violation list.
fn validate_all(columns: &[ColumnInput]) -> DatasetResult<()> {
    if columns.is_empty() {
        return Err(DatasetError::Validation(Violations(vec![Violation {
            column: String::new(),
            row: None,
            value: None,
            reason: "at least one column is required".to_string(),
        }])));
    }

    let mut violations = validate::validate_unique_names(columns);
    violations.extend(validate::validate_unique_indices(columns));
    violations.extend(validate::validate_types(columns));
    violations.extend(validate::validate_row_counts(columns));

    if violations.is_empty() {
        Ok(())
    } else {
        Err(DatasetError::Validation(Violations(violations)))
    }
}
