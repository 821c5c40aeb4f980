//! Transaction repository.
//!
//! Ordering note: date-descending order is a query-engine convention, not a
//! repository guarantee.

use super::{decode_records, encode_records, persist_records, RepoResult};
use crate::model::{self, Transaction};
use crate::store::{Collection, RecordStore};

pub struct TransactionRepository<'s> {
    store: &'s dyn RecordStore,
}

impl<'s> TransactionRepository<'s> {
    pub fn new(store: &'s dyn RecordStore) -> Self {
        Self { store }
    }

    pub fn get_all(&self) -> RepoResult<Vec<Transaction>> {
        let raw = self.store.read_all(Collection::Transactions)?;
        let today = model::today();
        let transactions = decode_records::<Transaction>(Collection::Transactions, raw)?
            .into_iter()
            .map(|transaction| transaction.normalized(today))
            .collect();
        Ok(transactions)
    }

    pub fn save_all(&self, transactions: &[Transaction]) -> RepoResult<()> {
        let today = model::today();
        let records = encode_records(
            Collection::Transactions,
            transactions
                .iter()
                .cloned()
                .map(|transaction| transaction.normalized(today)),
        )?;
        persist_records(self.store, Collection::Transactions, &records)
    }
}
