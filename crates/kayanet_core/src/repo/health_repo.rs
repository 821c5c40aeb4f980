//! Health record repository.

use super::{decode_records, encode_records, persist_records, RepoResult};
use crate::model::{self, HealthRecord};
use crate::store::{Collection, RecordStore};

pub struct HealthRepository<'s> {
    store: &'s dyn RecordStore,
}

impl<'s> HealthRepository<'s> {
    pub fn new(store: &'s dyn RecordStore) -> Self {
        Self { store }
    }

    pub fn get_all(&self) -> RepoResult<Vec<HealthRecord>> {
        let raw = self.store.read_all(Collection::HealthRecords)?;
        let today = model::today();
        let records = decode_records::<HealthRecord>(Collection::HealthRecords, raw)?
            .into_iter()
            .map(|record| record.normalized(today))
            .collect();
        Ok(records)
    }

    pub fn save_all(&self, records: &[HealthRecord]) -> RepoResult<()> {
        let today = model::today();
        let raw = encode_records(
            Collection::HealthRecords,
            records.iter().cloned().map(|record| record.normalized(today)),
        )?;
        persist_records(self.store, Collection::HealthRecords, &raw)
    }
}
