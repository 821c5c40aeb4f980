//! Repository layer: typed accessors over the record store.
//!
//! # Responsibility
//! - Expose get-all / save-all semantics per collection.
//! - Normalize every record on read (defaults, legacy field back-fill) so
//!   all consumers see the canonical shape.
//!
//! # Invariants
//! - Reading never mutates storage.
//! - `save_all` replaces the whole collection; there is no per-record diff.
//!   Collections are small (hundreds of records), so O(collection) writes
//!   per mutation are the accepted contract.
//! - Undecodable persisted records surface as `InvalidData`, never masked.

use crate::store::{Collection, RawRecord, RecordStore, StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod animal_repo;
pub mod health_repo;
pub mod transaction_repo;

pub use animal_repo::AnimalRepository;
pub use health_repo::HealthRepository;
pub use transaction_repo::TransactionRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository-level failure.
#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    /// Persisted record that does not decode into the entity shape.
    InvalidData {
        collection: Collection,
        message: String,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidData {
                collection,
                message,
            } => write!(f, "invalid persisted record in {collection}: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::InvalidData { .. } => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub(crate) fn decode_records<T: DeserializeOwned>(
    collection: Collection,
    raw_records: Vec<RawRecord>,
) -> RepoResult<Vec<T>> {
    raw_records
        .into_iter()
        .map(|raw| {
            serde_json::from_value(raw).map_err(|err| RepoError::InvalidData {
                collection,
                message: err.to_string(),
            })
        })
        .collect()
}

pub(crate) fn encode_records<T: Serialize>(
    collection: Collection,
    entities: impl IntoIterator<Item = T>,
) -> RepoResult<Vec<RawRecord>> {
    entities
        .into_iter()
        .map(|entity| {
            serde_json::to_value(entity).map_err(|err| RepoError::InvalidData {
                collection,
                message: err.to_string(),
            })
        })
        .collect()
}

pub(crate) fn persist_records(
    store: &dyn RecordStore,
    collection: Collection,
    records: &[RawRecord],
) -> RepoResult<()> {
    let result: StoreResult<()> = store.replace_all(collection, records);
    result.map_err(Into::into)
}
