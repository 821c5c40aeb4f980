//! Animal repository.
//!
//! # Responsibility
//! - Read and write the animals collection through the record store.
//! - Back-fill legacy snake_case fields and defaults on every read.

use super::{decode_records, encode_records, persist_records, RepoResult};
use crate::model::{self, Animal};
use crate::store::{Collection, RecordStore};

pub struct AnimalRepository<'s> {
    store: &'s dyn RecordStore,
}

impl<'s> AnimalRepository<'s> {
    pub fn new(store: &'s dyn RecordStore) -> Self {
        Self { store }
    }

    /// Every stored animal, normalized. Never writes as a side effect, even
    /// when normalization changed a record; the canonical shape reaches
    /// storage on the next `save_all`.
    pub fn get_all(&self) -> RepoResult<Vec<Animal>> {
        let raw = self.store.read_all(Collection::Animals)?;
        let today = model::today();
        let animals = decode_records::<Animal>(Collection::Animals, raw)?
            .into_iter()
            .map(|animal| animal.normalized(today))
            .collect();
        Ok(animals)
    }

    /// Replaces the whole collection with the given set, normalized.
    pub fn save_all(&self, animals: &[Animal]) -> RepoResult<()> {
        let today = model::today();
        let records = encode_records(
            Collection::Animals,
            animals.iter().cloned().map(|animal| animal.normalized(today)),
        )?;
        persist_records(self.store, Collection::Animals, &records)
    }
}
