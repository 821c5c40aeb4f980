use kayanet_core::{Collection, MemoryRecordStore, RecordStore, StoreError};
use serde_json::json;

#[test]
fn replace_all_swaps_whole_collection() {
    let store = MemoryRecordStore::new();
    store.initialize().unwrap();

    store
        .replace_all(
            Collection::Animals,
            &[json!({"id": "S-1"}), json!({"id": "S-2"})],
        )
        .unwrap();
    store
        .replace_all(Collection::Animals, &[json!({"id": "S-3"})])
        .unwrap();

    let animals = store.read_all(Collection::Animals).unwrap();
    assert_eq!(animals.len(), 1);
    assert_eq!(animals[0]["id"], "S-3");
}

#[test]
fn replace_all_failure_leaves_previous_contents() {
    let store = MemoryRecordStore::new();
    store.initialize().unwrap();
    store
        .replace_all(Collection::Animals, &[json!({"id": "S-1"})])
        .unwrap();

    let err = store
        .replace_all(
            Collection::Animals,
            &[json!({"id": "S-2"}), json!({"id": ""})],
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingId(Collection::Animals)));

    let animals = store.read_all(Collection::Animals).unwrap();
    assert_eq!(animals.len(), 1);
    assert_eq!(animals[0]["id"], "S-1");
}

#[test]
fn upsert_and_delete_behave_like_the_durable_backend() {
    let store = MemoryRecordStore::new();
    store.initialize().unwrap();

    store
        .upsert(Collection::Transactions, &json!({"id": "t-1", "amount": 10}))
        .unwrap();
    store
        .upsert(Collection::Transactions, &json!({"id": "t-1", "amount": 20}))
        .unwrap();

    let transactions = store.read_all(Collection::Transactions).unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["amount"], 20);

    assert!(store.delete(Collection::Transactions, "t-1").unwrap());
    assert!(!store.delete(Collection::Transactions, "t-1").unwrap());
}

#[test]
fn seeded_legacy_blobs_are_imported_once() {
    let store = MemoryRecordStore::new()
        .with_legacy_blob(
            "kayanet_farm_sheep",
            r#"[{"id": "S-1", "gender": "Ewe"}, {"id": "S-2", "gender": "Ram"}]"#,
        )
        .with_legacy_blob("kayanet_farm_transactions", "[]");
    store.initialize().unwrap();

    assert_eq!(store.read_all(Collection::Animals).unwrap().len(), 2);

    // Blobs are consumed; a second initialize imports nothing new.
    store
        .replace_all(Collection::Animals, &[json!({"id": "S-9"})])
        .unwrap();
    store.initialize().unwrap();
    assert_eq!(store.read_all(Collection::Animals).unwrap().len(), 1);
}

#[test]
fn legacy_import_never_overwrites_existing_records() {
    let store = MemoryRecordStore::new()
        .with_legacy_blob("kayanet_farm_sheep", r#"[{"id": "S-1", "notes": "stale"}]"#);
    store
        .upsert(Collection::Animals, &json!({"id": "S-1", "notes": "current"}))
        .unwrap();
    store.initialize().unwrap();

    let animals = store.read_all(Collection::Animals).unwrap();
    assert_eq!(animals.len(), 1);
    assert_eq!(animals[0]["notes"], "current");
}

#[test]
fn malformed_legacy_blob_fails_initialize_and_is_kept_for_retry() {
    let store = MemoryRecordStore::new()
        .with_legacy_blob("kayanet_farm_sheep", "{not json");

    let err = store.initialize().unwrap_err();
    assert!(matches!(err, StoreError::LegacyImport { .. }));

    // The blob survives the failed attempt.
    let err = store.initialize().unwrap_err();
    assert!(matches!(err, StoreError::LegacyImport { .. }));
}

#[test]
fn snapshot_and_restore_round_trip() {
    let store = MemoryRecordStore::new();
    store.initialize().unwrap();
    store
        .replace_all(
            Collection::Animals,
            &[json!({"id": "S-1", "gender": "Ewe"})],
        )
        .unwrap();
    store
        .replace_all(
            Collection::Transactions,
            &[json!({"id": "t-1", "amount": 5.0})],
        )
        .unwrap();

    let snapshot = store.snapshot().unwrap();
    let restored = MemoryRecordStore::restore(&snapshot).unwrap();
    restored.initialize().unwrap();

    assert_eq!(restored.read_all(Collection::Animals).unwrap().len(), 1);
    assert_eq!(restored.read_all(Collection::Transactions).unwrap().len(), 1);
    assert_eq!(restored.read_all(Collection::HealthRecords).unwrap().len(), 0);
}
