use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tablevault_crypto::{
    CryptoError, CryptoResult, DataKey, EnvelopeCrypto, GeneratedDataKey, KeyAuthority,
    LocalKeyAuthority,
};
use tablevault_datasets::{
    ColumnInput, ColumnType, DatasetError, DatasetService, DatasetStore,
};

fn service() -> (DatasetService, DatasetStore) {
    let store = DatasetStore::open_in_memory().unwrap();
    let crypto = EnvelopeCrypto::new(Arc::new(LocalKeyAuthority::generate()));
    (DatasetService::new(store.clone(), crypto), store)
}

fn column(name: &str, column_type: ColumnType, index: i32, data: Vec<serde_json::Value>) -> ColumnInput {
    ColumnInput {
        name: name.to_string(),
        column_type,
        index,
        date_format: None,
        data,
    }
}

#[test]
fn create_and_read_number_column() {
    let (service, store) = service();

    let dataset = service
        .create_dataset(
            "metrics",
            &[column("value", ColumnType::Number, 0, vec![json!(10), json!(20), json!(30)])],
        )
        .unwrap();

    assert_eq!(dataset.meta.row_count, 3);
    assert_eq!(dataset.meta.column_count, 1);
    assert_eq!(dataset.columns.len(), 1);
    assert_eq!(dataset.columns[0].data, vec![json!(10), json!(20), json!(30)]);

    // The stored row carries only sealed blobs, no plaintext anywhere.
    let sealed = store.read_columns(&dataset.meta.id).unwrap();
    assert_eq!(sealed.len(), 1);
    assert!(!sealed[0].envelope.ciphertext.is_empty());
    assert!(!sealed[0].envelope.nonce.is_empty());
    assert!(!sealed[0].envelope.auth_tag.is_empty());
    assert!(!sealed[0].envelope.wrapped_key.is_empty());
}

#[test]
fn roundtrip_across_types_and_lengths() {
    let (service, _store) = service();

    let columns = vec![
        column("a", ColumnType::Number, 0, vec![]),
        column("b", ColumnType::String, 1, vec![]),
    ];
    let dataset = service.create_dataset("edge-empty", &columns).unwrap();
    assert_eq!(dataset.meta.row_count, 0);
    for col in &dataset.columns {
        assert!(col.data.is_empty());
    }

    let dataset = service
        .create_dataset(
            "edge-single",
            &[column("only", ColumnType::Number, 0, vec![json!(-0.25)])],
        )
        .unwrap();
    assert_eq!(dataset.meta.row_count, 1);
    assert_eq!(dataset.columns[0].data, vec![json!(-0.25)]);

    let columns = vec![
        column(
            "numbers",
            ColumnType::Number,
            0,
            vec![json!(-42), json!(0.5), json!(1e9), json!(3)],
        ),
        column(
            "labels",
            ColumnType::String,
            1,
            vec![json!("a"), json!(""), json!("ünïcode"), json!("d")],
        ),
        column(
            "when",
            ColumnType::Date,
            2,
            vec![
                json!("2024-01-31"),
                json!("2024-02-29"),
                json!("2023-06-15T08:30:00Z"),
                json!("1970-01-01"),
            ],
        ),
    ];
    let dataset = service.create_dataset("edge-mixed", &columns).unwrap();
    assert_eq!(dataset.meta.row_count, 4);
    assert_eq!(dataset.columns[0].data[0], json!(-42));
    assert_eq!(dataset.columns[0].data[1], json!(0.5));
    assert_eq!(dataset.columns[1].data[2], json!("ünïcode"));
    assert_eq!(dataset.columns[2].data[1], json!("2024-02-29"));
}

#[test]
fn date_format_hint_survives_the_roundtrip() {
    let (service, _store) = service();

    let mut input = column("when", ColumnType::Date, 0, vec![json!("2024-03-01")]);
    input.date_format = Some("%d %b %Y".to_string());

    let dataset = service.create_dataset("formatted", &[input]).unwrap();
    assert_eq!(dataset.columns[0].date_format.as_deref(), Some("%d %b %Y"));
}

#[test]
fn columns_come_back_ordered_by_index() {
    let (service, _store) = service();

    // Deliberately out of order in the request.
    let dataset = service
        .create_dataset(
            "ordering",
            &[
                column("third", ColumnType::String, 2, vec![json!("c")]),
                column("first", ColumnType::String, 0, vec![json!("a")]),
                column("second", ColumnType::String, 1, vec![json!("b")]),
            ],
        )
        .unwrap();

    let names: Vec<&str> = dataset.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}

#[test]
fn update_replaces_every_column_row() {
    let (service, store) = service();

    let dataset = service
        .create_dataset(
            "swap",
            &[
                column("a", ColumnType::Number, 0, vec![json!(1)]),
                column("b", ColumnType::Number, 1, vec![json!(2)]),
                column("c", ColumnType::Number, 2, vec![json!(3)]),
            ],
        )
        .unwrap();
    let id = dataset.meta.id.clone();

    let old_rows = store.read_columns(&id).unwrap();
    let old_ciphertexts: Vec<String> =
        old_rows.iter().map(|c| c.envelope.ciphertext.clone()).collect();
    let old_ids: Vec<String> = old_rows.iter().map(|c| c.id.clone()).collect();

    let updated = service
        .update_dataset(
            &id,
            &[
                column("x", ColumnType::Number, 0, vec![json!(7), json!(8)]),
                column("y", ColumnType::Number, 1, vec![json!(9), json!(10)]),
            ],
        )
        .unwrap();

    assert_eq!(updated.meta.column_count, 2);
    assert_eq!(updated.meta.row_count, 2);

    let new_rows = store.read_columns(&id).unwrap();
    assert_eq!(new_rows.len(), 2);
    for row in &new_rows {
        assert!(!old_ciphertexts.contains(&row.envelope.ciphertext));
        assert!(!old_ids.contains(&row.id));
    }
}

#[test]
fn update_of_missing_dataset_is_not_found() {
    let (service, _store) = service();
    let result = service.update_dataset(
        &tablevault_datasets::DatasetId::new(),
        &[column("a", ColumnType::Number, 0, vec![json!(1)])],
    );
    assert!(matches!(result, Err(DatasetError::NotFound(_))));
}

/// Authority that delegates to a real one but fails key generation after a
/// fixed number of successes, simulating a mid-write outage.
struct FlakyAuthority {
    inner: LocalKeyAuthority,
    remaining: AtomicUsize,
}

impl FlakyAuthority {
    fn failing_after(successes: usize) -> Self {
        Self {
            inner: LocalKeyAuthority::generate(),
            remaining: AtomicUsize::new(successes),
        }
    }
}

impl KeyAuthority for FlakyAuthority {
    fn generate_data_key(&self) -> CryptoResult<GeneratedDataKey> {
        if self.remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
        {
            return Err(CryptoError::KeyGeneration("authority outage".to_string()));
        }
        self.inner.generate_data_key()
    }

    fn unwrap_data_key(&self, wrapped: &[u8]) -> CryptoResult<DataKey> {
        self.inner.unwrap_data_key(wrapped)
    }
}

#[test]
fn create_persists_nothing_when_encryption_fails_midway() {
    let store = DatasetStore::open_in_memory().unwrap();
    // Four keys succeed; the fifth column's key generation fails.
    let crypto = EnvelopeCrypto::new(Arc::new(FlakyAuthority::failing_after(4)));
    let service = DatasetService::new(store.clone(), crypto);

    let columns: Vec<ColumnInput> = (0..5)
        .map(|i| column(&format!("col{i}"), ColumnType::Number, i, vec![json!(i)]))
        .collect();

    let result = service.create_dataset("doomed", &columns);
    assert!(matches!(result, Err(DatasetError::Encryption(_))));

    // No dataset and no column rows survived the failed write.
    assert!(service.list_datasets().unwrap().is_empty());
}

#[test]
fn failed_update_leaves_previous_columns_intact() {
    let store = DatasetStore::open_in_memory().unwrap();
    let crypto = EnvelopeCrypto::new(Arc::new(FlakyAuthority::failing_after(2)));
    let service = DatasetService::new(store.clone(), crypto);

    let dataset = service
        .create_dataset(
            "stable",
            &[
                column("a", ColumnType::Number, 0, vec![json!(1)]),
                column("b", ColumnType::Number, 1, vec![json!(2)]),
            ],
        )
        .unwrap();
    let id = dataset.meta.id.clone();

    // The authority is exhausted; encryption fails before any row swap.
    let result = service.update_dataset(
        &id,
        &[column("c", ColumnType::Number, 0, vec![json!(3)])],
    );
    assert!(matches!(result, Err(DatasetError::Encryption(_))));

    let current = service.get_dataset(&id).unwrap();
    assert_eq!(current.meta.column_count, 2);
    assert_eq!(current.columns[0].data, vec![json!(1)]);
    assert_eq!(current.columns[1].data, vec![json!(2)]);
}

#[test]
fn duplicate_ordinals_are_rejected_before_any_write() {
    let (service, _store) = service();

    let result = service.create_dataset(
        "collide",
        &[
            column("a", ColumnType::Number, 0, vec![json!(1)]),
            column("b", ColumnType::Number, 0, vec![json!(2)]),
        ],
    );
    assert!(matches!(result, Err(DatasetError::Validation(_))));
    assert!(service.list_datasets().unwrap().is_empty());
}

#[test]
fn type_violations_name_column_row_and_value() {
    let (service, _store) = service();

    let result = service.create_dataset(
        "bad-number",
        &[column(
            "price",
            ColumnType::Number,
            0,
            vec![json!(1), json!(2), json!(3), json!("abc")],
        )],
    );

    match result {
        Err(DatasetError::Validation(violations)) => {
            assert_eq!(violations.0.len(), 1);
            let v = &violations.0[0];
            assert_eq!(v.column, "price");
            assert_eq!(v.row, Some(3));
            assert_eq!(v.value, Some(json!("abc")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn impossible_calendar_date_is_rejected() {
    let (service, _store) = service();

    let result = service.create_dataset(
        "bad-date",
        &[column("day", ColumnType::Date, 0, vec![json!("1999-02-30")])],
    );

    match result {
        Err(DatasetError::Validation(violations)) => {
            assert_eq!(violations.0[0].column, "day");
            assert_eq!(violations.0[0].row, Some(0));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn every_violation_is_reported_in_one_rejection() {
    let (service, _store) = service();

    let result = service.create_dataset(
        "multi-bad",
        &[
            column("n", ColumnType::Number, 0, vec![json!("x"), json!(1)]),
            column("n", ColumnType::Date, 1, vec![json!("2024-13-01"), json!("2024-01-01")]),
        ],
    );

    match result {
        Err(DatasetError::Validation(violations)) => {
            // duplicate name + bad number + bad date
            assert_eq!(violations.0.len(), 3);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn unequal_column_lengths_are_rejected() {
    let (service, _store) = service();

    let result = service.create_dataset(
        "ragged",
        &[
            column("a", ColumnType::Number, 0, vec![json!(1), json!(2)]),
            column("b", ColumnType::Number, 1, vec![json!(1)]),
        ],
    );
    assert!(matches!(result, Err(DatasetError::Validation(_))));
}

#[test]
fn empty_column_list_is_rejected() {
    let (service, _store) = service();
    let result = service.create_dataset("nothing", &[]);
    assert!(matches!(result, Err(DatasetError::Validation(_))));
}

#[test]
fn delete_cascades_to_column_rows() {
    let (service, store) = service();

    let dataset = service
        .create_dataset(
            "gone",
            &[column("a", ColumnType::String, 0, vec![json!("x")])],
        )
        .unwrap();
    let id = dataset.meta.id.clone();

    service.delete_dataset(&id).unwrap();

    assert!(matches!(service.get_dataset(&id), Err(DatasetError::NotFound(_))));
    assert!(store.read_columns(&id).unwrap().is_empty());
}

#[test]
fn rename_and_list() {
    let (service, _store) = service();

    let dataset = service
        .create_dataset(
            "old-name",
            &[column("a", ColumnType::String, 0, vec![json!("x")])],
        )
        .unwrap();

    service.rename_dataset(&dataset.meta.id, "new-name").unwrap();

    let listed = service.list_datasets().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "new-name");
}

#[test]
fn file_backed_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("datasets.duckdb");

    let store = DatasetStore::open(&path).unwrap();
    let crypto = EnvelopeCrypto::new(Arc::new(LocalKeyAuthority::generate()));
    let service = DatasetService::new(store, crypto);

    let dataset = service
        .create_dataset(
            "on-disk",
            &[column("v", ColumnType::Number, 0, vec![json!(5), json!(6)])],
        )
        .unwrap();
    assert_eq!(dataset.columns[0].data, vec![json!(5), json!(6)]);
}

#[test]
fn missing_dataset_read_is_not_found() {
    let (service, _store) = service();
    let result = service.get_dataset(&tablevault_datasets::DatasetId::new());
    assert!(matches!(result, Err(DatasetError::NotFound(_))));
}
