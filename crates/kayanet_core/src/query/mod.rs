//! Query and filter engine.
//!
//! # Responsibility
//! - Derive filtered and aggregated views from repository snapshots for the
//!   dashboard and tables.
//!
//! # Invariants
//! - Every function here is pure: no I/O, no clock reads; `today` is passed
//!   in by the caller.
//! - Date-descending ordering lives here, not in the repositories.

mod filters;
mod metrics;

pub use filters::{
    age_in_years, filter_animals_by_type, filter_transactions_by_animal,
    filter_transactions_by_period, recent_transactions, sorted_by_date_desc,
    sorted_health_by_date_desc, AnimalTypeFilter, PeriodFilter,
};
pub use metrics::{
    compute_dashboard_metrics, compute_financial_summary, DashboardMetrics, FinancialSummary,
};
