//! Persistence and query core for the Kayanet farm record keeper.
//!
//! Tracks animals (sheep/goats), financial transactions and health events,
//! and derives the filtered views and aggregate metrics the presentation
//! layer renders. This crate is the single source of truth for the
//! cross-collection invariants: a sale marks its animal sold, deleting the
//! sale reverts it, a death record marks it dead for good.

pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{
    AdditionType, Animal, AnimalStatus, AnimalType, Gender, HealthRecord, HealthRecordType,
    Transaction, TransactionType, ValidationError,
};
pub use query::{
    age_in_years, compute_dashboard_metrics, compute_financial_summary, filter_animals_by_type,
    filter_transactions_by_animal, filter_transactions_by_period, recent_transactions,
    sorted_by_date_desc, sorted_health_by_date_desc, AnimalTypeFilter, DashboardMetrics,
    FinancialSummary, PeriodFilter,
};
pub use repo::{AnimalRepository, HealthRepository, RepoError, TransactionRepository};
pub use service::{FarmService, NewHealthRecord, NewTransaction, ServiceError};
pub use store::{
    Collection, MemoryRecordStore, RawRecord, RecordStore, SqliteRecordStore, StoreError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
