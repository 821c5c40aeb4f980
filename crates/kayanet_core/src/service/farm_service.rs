//! Farm record coordinator.
//!
//! # Responsibility
//! - Own the record store handle (no ambient global) and the readiness flag.
//! - Implement the cross-collection protocols: sale marks an animal sold,
//!   sale deletion reverts it, a death record marks it dead.
//!
//! # Invariants
//! - Animals are always persisted before the causing transaction or health
//!   record, matching the source protocol order.
//! - A sale edit skips the active re-check (only creation validates it);
//!   deleting a sale reverts the animal to active unconditionally. Both are
//!   preserved source behaviors, flagged for product clarification.
//! - Nothing ever reverts a dead animal.

use crate::model::{
    Animal, AnimalStatus, HealthRecord, HealthRecordType, Transaction, TransactionType,
    ValidationError,
};
use crate::repo::{AnimalRepository, HealthRepository, RepoError, TransactionRepository};
use crate::store::RecordStore;
use chrono::NaiveDate;
use log::info;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Coordinator-level failure. Every variant except `Repo` is recoverable by
/// the user correcting input or retrying after initialization.
#[derive(Debug)]
pub enum ServiceError {
    /// Operation attempted before `initialize` succeeded.
    NotReady,
    /// Animal creation with an id that already exists.
    DuplicateId(String),
    AnimalNotFound(String),
    /// Sale creation references an animal that is not active.
    AnimalNotActive(String),
    TransactionNotFound(String),
    HealthRecordNotFound(String),
    Validation(ValidationError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "store is not ready yet; retry shortly"),
            Self::DuplicateId(id) => write!(f, "animal with id {id} already exists"),
            Self::AnimalNotFound(id) => write!(f, "animal not found: {id}"),
            Self::AnimalNotActive(id) => write!(f, "animal is not active: {id}"),
            Self::TransactionNotFound(id) => write!(f, "transaction not found: {id}"),
            Self::HealthRecordNotFound(id) => write!(f, "health record not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Request model for creating a transaction; the id is generated here.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub sheep_id: Option<String>,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
}

/// Request model for creating a health record; the id is generated here.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHealthRecord {
    pub sheep_id: String,
    pub kind: HealthRecordType,
    pub weight: Option<f64>,
    pub medication: String,
    pub date: NaiveDate,
    pub notes: String,
}

/// Coordinator facade owning the store handle.
pub struct FarmService<S: RecordStore> {
    store: S,
    ready: AtomicBool,
    // Serializes the read-modify-write protocols; a second mutation cannot
    // start before the first finishes both persists.
    mutation_lock: Mutex<()>,
}

impl<S: RecordStore> FarmService<S> {
    /// Wraps a store. Operations reject with `NotReady` until `initialize`
    /// succeeds.
    pub fn new(store: S) -> Self {
        Self {
            store,
            ready: AtomicBool::new(false),
            mutation_lock: Mutex::new(()),
        }
    }

    /// Initializes the store and flips the readiness flag exactly once.
    /// Safe to call again; the underlying initialize is idempotent.
    pub fn initialize(&self) -> ServiceResult<()> {
        let _guard = self.lock_mutations();
        self.store
            .initialize()
            .map_err(|err| ServiceError::Repo(RepoError::Store(err)))?;
        self.ready.store(true, Ordering::Release);
        info!("event=service_init module=service status=ok");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// The underlying store, for backend-specific concerns (snapshot export).
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get_animals(&self) -> ServiceResult<Vec<Animal>> {
        self.ensure_ready()?;
        Ok(self.animals().get_all()?)
    }

    pub fn get_transactions(&self) -> ServiceResult<Vec<Transaction>> {
        self.ensure_ready()?;
        Ok(self.transactions().get_all()?)
    }

    pub fn get_health_records(&self) -> ServiceResult<Vec<HealthRecord>> {
        self.ensure_ready()?;
        Ok(self.health_records().get_all()?)
    }

    /// Creates one animal. Status is forced to active; a birth addition
    /// carries no purchase cost.
    pub fn add_animal(&self, mut animal: Animal) -> ServiceResult<()> {
        let _guard = self.lock_mutations();
        self.ensure_ready()?;
        animal.status = AnimalStatus::Active;
        animal.validate()?;

        let mut animals = self.animals().get_all()?;
        if animals.iter().any(|existing| existing.id == animal.id) {
            return Err(ServiceError::DuplicateId(animal.id));
        }

        info!(
            "event=animal_add module=service status=ok id={} type={}",
            animal.id, animal.animal_type
        );
        animals.push(animal);
        self.animals().save_all(&animals)?;
        Ok(())
    }

    /// Replaces one animal by id. The status field is taken as given; the
    /// editing surface exposes it directly.
    pub fn update_animal(&self, animal: Animal) -> ServiceResult<()> {
        let _guard = self.lock_mutations();
        self.ensure_ready()?;
        animal.validate()?;

        let mut animals = self.animals().get_all()?;
        let slot = animals
            .iter_mut()
            .find(|existing| existing.id == animal.id)
            .ok_or_else(|| ServiceError::AnimalNotFound(animal.id.clone()))?;
        *slot = animal;
        self.animals().save_all(&animals)?;
        Ok(())
    }

    /// Deletes one animal. Transactions and health records referencing it
    /// become orphaned references, by design.
    pub fn delete_animal(&self, id: &str) -> ServiceResult<()> {
        let _guard = self.lock_mutations();
        self.ensure_ready()?;

        let mut animals = self.animals().get_all()?;
        let before = animals.len();
        animals.retain(|animal| animal.id != id);
        if animals.len() == before {
            return Err(ServiceError::AnimalNotFound(id.to_string()));
        }
        self.animals().save_all(&animals)?;
        info!("event=animal_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Creates one transaction. A sale requires its animal to exist and be
    /// active, and flips it to sold before the transaction is persisted.
    pub fn add_transaction(&self, draft: NewTransaction) -> ServiceResult<Transaction> {
        let _guard = self.lock_mutations();
        self.ensure_ready()?;

        let mut transactions = self.transactions().get_all()?;
        let transaction = Transaction {
            id: next_record_id(transactions.iter().map(|t| t.id.as_str())),
            kind: draft.kind,
            sheep_id: draft.sheep_id,
            amount: draft.amount,
            date: draft.date,
            description: draft.description,
            date_added: None,
            extra: serde_json::Map::new(),
        };
        transaction.validate()?;

        if transaction.kind == TransactionType::Sale {
            if let Some(sheep_id) = transaction.sheep_id.as_deref() {
                self.mark_sold(sheep_id, true)?;
            }
        }

        info!(
            "event=transaction_add module=service status=ok id={} kind={}",
            transaction.id, transaction.kind
        );
        transactions.push(transaction.clone());
        self.transactions().save_all(&transactions)?;
        Ok(transaction)
    }

    /// Replaces one transaction by id. A sale edit re-checks only that the
    /// animal exists, not that it is active (source behavior), and still
    /// forces the animal to sold.
    pub fn update_transaction(&self, transaction: Transaction) -> ServiceResult<()> {
        let _guard = self.lock_mutations();
        self.ensure_ready()?;
        transaction.validate()?;

        let mut transactions = self.transactions().get_all()?;
        let index = transactions
            .iter()
            .position(|existing| existing.id == transaction.id)
            .ok_or_else(|| ServiceError::TransactionNotFound(transaction.id.clone()))?;

        if transaction.kind == TransactionType::Sale {
            if let Some(sheep_id) = transaction.sheep_id.as_deref() {
                self.mark_sold(sheep_id, false)?;
            }
        }

        transactions[index] = transaction;
        self.transactions().save_all(&transactions)?;
        Ok(())
    }

    /// Deletes one transaction. Removing a sale reverts the referenced
    /// animal to active unconditionally, even when its status changed since.
    pub fn delete_transaction(&self, id: &str) -> ServiceResult<()> {
        let _guard = self.lock_mutations();
        self.ensure_ready()?;

        let mut transactions = self.transactions().get_all()?;
        let removed = transactions
            .iter()
            .position(|transaction| transaction.id == id)
            .map(|index| transactions.remove(index))
            .ok_or_else(|| ServiceError::TransactionNotFound(id.to_string()))?;
        self.transactions().save_all(&transactions)?;

        if removed.kind == TransactionType::Sale {
            if let Some(sheep_id) = removed.sheep_id.as_deref() {
                let mut animals = self.animals().get_all()?;
                // The animal may have been deleted since; nothing to revert.
                if let Some(animal) = animals.iter_mut().find(|animal| animal.id == sheep_id) {
                    animal.status = AnimalStatus::Active;
                    self.animals().save_all(&animals)?;
                    info!(
                        "event=sale_revert module=service status=ok transaction={id} animal={sheep_id}"
                    );
                }
            }
        }
        Ok(())
    }

    /// Creates one health record. A death record marks the animal dead
    /// before the record is persisted; nothing ever reverts that.
    pub fn add_health_record(&self, draft: NewHealthRecord) -> ServiceResult<HealthRecord> {
        let _guard = self.lock_mutations();
        self.ensure_ready()?;

        let mut records = self.health_records().get_all()?;
        let record = HealthRecord {
            id: next_record_id(records.iter().map(|r| r.id.as_str())),
            sheep_id: draft.sheep_id,
            kind: draft.kind,
            weight: draft.weight,
            medication: draft.medication,
            date: draft.date,
            notes: draft.notes,
            date_added: None,
            extra: serde_json::Map::new(),
        };
        record.validate()?;

        self.apply_health_status(&record)?;

        records.push(record.clone());
        self.health_records().save_all(&records)?;
        Ok(record)
    }

    /// Replaces one health record by id, applying the death side effect the
    /// same way creation does.
    pub fn update_health_record(&self, record: HealthRecord) -> ServiceResult<()> {
        let _guard = self.lock_mutations();
        self.ensure_ready()?;
        record.validate()?;

        let mut records = self.health_records().get_all()?;
        let index = records
            .iter()
            .position(|existing| existing.id == record.id)
            .ok_or_else(|| ServiceError::HealthRecordNotFound(record.id.clone()))?;

        self.apply_health_status(&record)?;

        records[index] = record;
        self.health_records().save_all(&records)?;
        Ok(())
    }

    /// Deletes one health record. Deleting a death record does not revive
    /// the animal.
    pub fn delete_health_record(&self, id: &str) -> ServiceResult<()> {
        let _guard = self.lock_mutations();
        self.ensure_ready()?;

        let mut records = self.health_records().get_all()?;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(ServiceError::HealthRecordNotFound(id.to_string()));
        }
        self.health_records().save_all(&records)?;
        Ok(())
    }

    fn ensure_ready(&self) -> ServiceResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(ServiceError::NotReady)
        }
    }

    fn lock_mutations(&self) -> std::sync::MutexGuard<'_, ()> {
        self.mutation_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Flips the referenced animal to sold and persists animals first.
    /// `require_active` distinguishes sale creation from sale edit.
    fn mark_sold(&self, sheep_id: &str, require_active: bool) -> ServiceResult<()> {
        let mut animals = self.animals().get_all()?;
        let animal = animals
            .iter_mut()
            .find(|animal| animal.id == sheep_id)
            .ok_or_else(|| ServiceError::AnimalNotFound(sheep_id.to_string()))?;
        if require_active && animal.status != AnimalStatus::Active {
            return Err(ServiceError::AnimalNotActive(sheep_id.to_string()));
        }
        animal.status = AnimalStatus::Sold;
        self.animals().save_all(&animals)?;
        info!("event=sale_apply module=service status=ok animal={sheep_id}");
        Ok(())
    }

    /// Validates the referenced animal and applies the death side effect.
    fn apply_health_status(&self, record: &HealthRecord) -> ServiceResult<()> {
        let mut animals = self.animals().get_all()?;
        let animal = animals
            .iter_mut()
            .find(|animal| animal.id == record.sheep_id)
            .ok_or_else(|| ServiceError::AnimalNotFound(record.sheep_id.clone()))?;
        if record.kind == HealthRecordType::Death {
            animal.status = AnimalStatus::Dead;
            self.animals().save_all(&animals)?;
            info!(
                "event=death_record module=service status=ok animal={}",
                record.sheep_id
            );
        }
        Ok(())
    }

    fn animals(&self) -> AnimalRepository<'_> {
        AnimalRepository::new(&self.store)
    }

    fn transactions(&self) -> TransactionRepository<'_> {
        TransactionRepository::new(&self.store)
    }

    fn health_records(&self) -> HealthRepository<'_> {
        HealthRepository::new(&self.store)
    }
}

/// Timestamp-derived record id, bumped past any collision with existing ids.
fn next_record_id<'a>(existing: impl Iterator<Item = &'a str>) -> String {
    let taken: HashSet<&str> = existing.collect();
    let mut candidate = chrono::Utc::now().timestamp_millis();
    while taken.contains(candidate.to_string().as_str()) {
        candidate += 1;
    }
    candidate.to_string()
}

#[cfg(test)]
mod tests {
    use super::next_record_id;

    #[test]
    fn generated_id_skips_collisions() {
        let now = chrono::Utc::now().timestamp_millis();
        let taken = [now.to_string(), (now + 1).to_string()];
        let id = next_record_id(taken.iter().map(String::as_str));
        assert!(!taken.contains(&id));
        // Still timestamp-shaped.
        assert!(id.parse::<i64>().unwrap() >= now);
    }
}
