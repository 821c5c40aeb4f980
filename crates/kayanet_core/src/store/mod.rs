//! Record store abstraction and implementations.
//!
//! # Responsibility
//! - Define durable keyed storage over the three farm collections.
//! - Keep storage-medium details behind one interface so the repository
//!   layer stays backend-agnostic.
//!
//! # Invariants
//! - Every stored record is a JSON object with a non-empty string `id`.
//! - `replace_all` is all-or-nothing: a failure partway leaves the previous
//!   collection contents observable to subsequent reads.
//! - `initialize` is idempotent and never loses existing data.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

pub(crate) mod legacy;
pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

/// A raw persisted record: JSON object carrying at least an `id`.
pub type RawRecord = serde_json::Value;

pub type StoreResult<T> = Result<T, StoreError>;

/// The three independently addressable collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Animals,
    Transactions,
    HealthRecords,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Animals,
        Collection::Transactions,
        Collection::HealthRecords,
    ];

    /// Stable storage name, shared by every backend.
    pub fn storage_name(self) -> &'static str {
        match self {
            Self::Animals => "animals",
            Self::Transactions => "transactions",
            Self::HealthRecords => "health_records",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.storage_name())
    }
}

/// Storage-layer failure.
#[derive(Debug)]
pub enum StoreError {
    /// The storage medium cannot be opened; the caller picks a fallback.
    Unavailable(String),
    Sqlite(rusqlite::Error),
    /// Persisted schema is newer than this binary supports.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Record without a usable string `id`.
    MissingId(Collection),
    /// Persisted record that cannot be decoded, or a duplicate id in a
    /// `replace_all` batch.
    MalformedRecord {
        collection: Collection,
        message: String,
    },
    /// A legacy blob exists but cannot be imported.
    LegacyImport { key: String, message: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::MissingId(collection) => {
                write!(f, "record in {collection} has no usable string id")
            }
            Self::MalformedRecord {
                collection,
                message,
            } => write!(f, "malformed record in {collection}: {message}"),
            Self::LegacyImport { key, message } => {
                write!(f, "legacy blob `{key}` cannot be imported: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Durable keyed storage for the three farm collections.
///
/// Methods take `&self`; implementations serialize access through an internal
/// mutex held for the duration of each call, so no reader can observe a
/// half-applied `replace_all`.
pub trait RecordStore {
    /// Opens or upgrades the underlying store and imports legacy blobs.
    /// Re-running on an initialized store is a no-op that loses nothing.
    fn initialize(&self) -> StoreResult<()>;

    /// Every record currently stored, in no guaranteed order.
    fn read_all(&self, collection: Collection) -> StoreResult<Vec<RawRecord>>;

    /// Atomically replaces the collection contents with the given set.
    fn replace_all(&self, collection: Collection, records: &[RawRecord]) -> StoreResult<()>;

    /// Inserts or overwrites one record, keyed by its `id`.
    fn upsert(&self, collection: Collection, record: &RawRecord) -> StoreResult<()>;

    /// Removes one record; returns whether it existed.
    fn delete(&self, collection: Collection, id: &str) -> StoreResult<bool>;
}

/// Extracts the mandatory `id` of a raw record.
pub(crate) fn record_id(collection: Collection, record: &RawRecord) -> StoreResult<&str> {
    record
        .get("id")
        .and_then(RawRecord::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or(StoreError::MissingId(collection))
}

/// Locks a mutex, recovering the inner state if a previous holder panicked.
pub(crate) fn lock_store<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_id_requires_non_empty_string() {
        assert_eq!(
            record_id(Collection::Animals, &json!({"id": "S-1"})).unwrap(),
            "S-1"
        );
        assert!(matches!(
            record_id(Collection::Animals, &json!({"id": ""})),
            Err(StoreError::MissingId(Collection::Animals))
        ));
        assert!(matches!(
            record_id(Collection::Animals, &json!({"id": 7})),
            Err(StoreError::MissingId(Collection::Animals))
        ));
        assert!(matches!(
            record_id(Collection::Animals, &json!({})),
            Err(StoreError::MissingId(Collection::Animals))
        ));
    }
}
