//! Legacy flat-blob import.
//!
//! Older versions of the storage layer kept one JSON array-of-objects blob per
//! collection under a well-known key. The first successful `initialize` merges
//! those blobs into the collections and removes them. Records whose id already
//! exists in the collection are kept as-is; the blob never overwrites them.

use super::{record_id, Collection, RawRecord, StoreError, StoreResult};
use std::collections::HashSet;

/// Well-known blob keys and the collections they feed.
pub(crate) const LEGACY_BLOB_KEYS: [(&str, Collection); 3] = [
    ("kayanet_farm_sheep", Collection::Animals),
    ("kayanet_farm_transactions", Collection::Transactions),
    ("kayanet_farm_health", Collection::HealthRecords),
];

/// Parses one legacy blob payload into raw records.
///
/// A malformed blob fails the import; nothing is silently discarded.
pub(crate) fn parse_legacy_blob(key: &str, payload: &str) -> StoreResult<Vec<RawRecord>> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|err| StoreError::LegacyImport {
            key: key.to_string(),
            message: err.to_string(),
        })?;
    match value {
        serde_json::Value::Array(items) => Ok(items),
        other => Err(StoreError::LegacyImport {
            key: key.to_string(),
            message: format!("expected a JSON array, got {other}"),
        }),
    }
}

/// Keeps the records whose id is not already present in the collection.
/// Rejects records without a usable id and duplicates inside the blob itself.
pub(crate) fn records_to_import(
    collection: Collection,
    existing_ids: &HashSet<String>,
    incoming: Vec<RawRecord>,
) -> StoreResult<Vec<RawRecord>> {
    let mut seen = HashSet::new();
    let mut fresh = Vec::new();
    for record in incoming {
        let id = record_id(collection, &record)?.to_string();
        if existing_ids.contains(&id) || !seen.insert(id) {
            continue;
        }
        fresh.push(record);
    }
    Ok(fresh)
}
