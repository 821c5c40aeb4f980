//! In-memory record store.
//!
//! Fallback backend for when the durable medium cannot be opened, and the
//! default backend in tests. Holds the same collection layout as the SQLite
//! store and honors the same contracts, including legacy blob import.
//!
//! The whole working set can be exported with `snapshot` and rebuilt with
//! `restore`; both run under the same mutex as `replace_all`, so an export
//! can never observe a half-applied save.

use super::legacy::{parse_legacy_blob, records_to_import, LEGACY_BLOB_KEYS};
use super::{lock_store, record_id, Collection, RawRecord, RecordStore, StoreError, StoreResult};
use log::info;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct MemoryInner {
    collections: HashMap<Collection, BTreeMap<String, RawRecord>>,
    legacy_blobs: HashMap<String, String>,
}

/// Volatile store keyed the same way as the durable backend.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one legacy flat blob to be merged by the next `initialize`.
    pub fn with_legacy_blob(self, key: impl Into<String>, payload: impl Into<String>) -> Self {
        {
            let mut inner = lock_store(&self.inner);
            inner.legacy_blobs.insert(key.into(), payload.into());
        }
        self
    }

    /// Exports the whole working set as one JSON document keyed by
    /// collection storage name.
    pub fn snapshot(&self) -> StoreResult<String> {
        let inner = lock_store(&self.inner);
        let mut document = serde_json::Map::new();
        for collection in Collection::ALL {
            let records: Vec<RawRecord> = inner
                .collections
                .get(&collection)
                .map(|map| map.values().cloned().collect())
                .unwrap_or_default();
            document.insert(
                collection.storage_name().to_string(),
                serde_json::Value::Array(records),
            );
        }
        Ok(serde_json::Value::Object(document).to_string())
    }

    /// Rebuilds a store from a `snapshot` export.
    pub fn restore(snapshot: &str) -> StoreResult<Self> {
        let document: serde_json::Value =
            serde_json::from_str(snapshot).map_err(|err| StoreError::Unavailable(format!(
                "snapshot cannot be parsed: {err}"
            )))?;

        let store = Self::new();
        {
            let mut inner = lock_store(&store.inner);
            for collection in Collection::ALL {
                let mut map = BTreeMap::new();
                if let Some(records) = document
                    .get(collection.storage_name())
                    .and_then(serde_json::Value::as_array)
                {
                    for record in records {
                        let id = record_id(collection, record)?;
                        map.insert(id.to_string(), record.clone());
                    }
                }
                inner.collections.insert(collection, map);
            }
        }
        Ok(store)
    }
}

impl RecordStore for MemoryRecordStore {
    fn initialize(&self) -> StoreResult<()> {
        let mut inner = lock_store(&self.inner);
        for collection in Collection::ALL {
            inner.collections.entry(collection).or_default();
        }

        // Parse and filter every blob before touching any collection, so a
        // malformed blob fails the whole import and leaves the blobs in
        // place for a retry.
        let mut pending: Vec<(Collection, Vec<RawRecord>)> = Vec::new();
        for (key, collection) in LEGACY_BLOB_KEYS {
            let Some(payload) = inner.legacy_blobs.get(key) else {
                continue;
            };
            let incoming = parse_legacy_blob(key, payload)?;
            let existing_ids: HashSet<String> = inner
                .collections
                .get(&collection)
                .map(|map| map.keys().cloned().collect())
                .unwrap_or_default();
            let fresh = records_to_import(collection, &existing_ids, incoming)?;
            pending.push((collection, fresh));
        }
        for (collection, fresh) in pending {
            let existing = inner.collections.entry(collection).or_default();
            for record in fresh {
                let id = record_id(collection, &record)?.to_string();
                existing.insert(id, record);
            }
        }
        inner.legacy_blobs.clear();

        info!("event=store_init module=store status=ok backend=memory");
        Ok(())
    }

    fn read_all(&self, collection: Collection) -> StoreResult<Vec<RawRecord>> {
        let inner = lock_store(&self.inner);
        Ok(inner
            .collections
            .get(&collection)
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default())
    }

    fn replace_all(&self, collection: Collection, records: &[RawRecord]) -> StoreResult<()> {
        // Stage into a fresh map first; the live collection is swapped only
        // after every record has passed id validation.
        let mut staged = BTreeMap::new();
        for record in records {
            let id = record_id(collection, record)?.to_string();
            if staged.insert(id.clone(), record.clone()).is_some() {
                return Err(StoreError::MalformedRecord {
                    collection,
                    message: format!("duplicate id `{id}` in replace_all batch"),
                });
            }
        }

        let mut inner = lock_store(&self.inner);
        inner.collections.insert(collection, staged);
        Ok(())
    }

    fn upsert(&self, collection: Collection, record: &RawRecord) -> StoreResult<()> {
        let id = record_id(collection, record)?.to_string();
        let mut inner = lock_store(&self.inner);
        inner
            .collections
            .entry(collection)
            .or_default()
            .insert(id, record.clone());
        Ok(())
    }

    fn delete(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let mut inner = lock_store(&self.inner);
        Ok(inner
            .collections
            .entry(collection)
            .or_default()
            .remove(id)
            .is_some())
    }
}
