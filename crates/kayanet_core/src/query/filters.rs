//! Filter functions over repository snapshots.

use crate::model::{Animal, AnimalType, HealthRecord, Transaction};
use chrono::{Datelike, Days, Months, NaiveDate};
use std::collections::HashSet;

/// Species filter for animal and transaction views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnimalTypeFilter {
    #[default]
    All,
    Only(AnimalType),
}

/// Calendar period filter for transaction views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodFilter {
    All,
    ThisMonth,
    ThisYear,
    /// Inclusive bounds.
    Custom { start: NaiveDate, end: NaiveDate },
}

impl PeriodFilter {
    /// Builds a custom period; missing bounds fall back to unfiltered,
    /// matching the form behavior when a date input is left empty.
    pub fn custom(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) => Self::Custom { start, end },
            _ => Self::All,
        }
    }

    /// Inclusive date bounds for this period, or `None` for unfiltered.
    fn bounds(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            Self::All => None,
            Self::ThisMonth => month_bounds(today),
            Self::ThisYear => {
                let start = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
                let end = NaiveDate::from_ymd_opt(today.year(), 12, 31)?;
                Some((start, end))
            }
            Self::Custom { start, end } => Some((start, end)),
        }
    }
}

fn month_bounds(today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = today.with_day(1)?;
    let end = start
        .checked_add_months(Months::new(1))?
        .checked_sub_days(Days::new(1))?;
    Some((start, end))
}

/// Identity for `All`, else an equality filter on the species.
pub fn filter_animals_by_type(animals: &[Animal], filter: AnimalTypeFilter) -> Vec<Animal> {
    match filter {
        AnimalTypeFilter::All => animals.to_vec(),
        AnimalTypeFilter::Only(animal_type) => animals
            .iter()
            .filter(|animal| animal.animal_type == animal_type)
            .cloned()
            .collect(),
    }
}

/// Keeps transactions whose referenced animal matches the species filter.
/// Once a specific species is selected, transactions without an animal
/// reference are excluded.
pub fn filter_transactions_by_animal(
    transactions: &[Transaction],
    animals: &[Animal],
    filter: AnimalTypeFilter,
) -> Vec<Transaction> {
    let AnimalTypeFilter::Only(animal_type) = filter else {
        return transactions.to_vec();
    };

    let matching_ids: HashSet<&str> = animals
        .iter()
        .filter(|animal| animal.animal_type == animal_type)
        .map(|animal| animal.id.as_str())
        .collect();

    transactions
        .iter()
        .filter(|transaction| {
            transaction
                .sheep_id
                .as_deref()
                .is_some_and(|id| matching_ids.contains(id))
        })
        .cloned()
        .collect()
}

/// Keeps transactions dated inside the period, bounds inclusive.
pub fn filter_transactions_by_period(
    transactions: &[Transaction],
    period: &PeriodFilter,
    today: NaiveDate,
) -> Vec<Transaction> {
    let Some((start, end)) = period.bounds(today) else {
        return transactions.to_vec();
    };
    transactions
        .iter()
        .filter(|transaction| transaction.date >= start && transaction.date <= end)
        .cloned()
        .collect()
}

/// Newest-first transaction ordering, the table and dashboard convention.
pub fn sorted_by_date_desc(transactions: &[Transaction]) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

/// Newest-first health record ordering.
pub fn sorted_health_by_date_desc(records: &[HealthRecord]) -> Vec<HealthRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

/// The `limit` newest transactions, for the dashboard panel.
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted = sorted_by_date_desc(transactions);
    sorted.truncate(limit);
    sorted
}

/// Whole years between birth and `today`; `None` when the birth date is
/// unknown.
pub fn age_in_years(birth_date: Option<NaiveDate>, today: NaiveDate) -> Option<i32> {
    let birth = birth_date?;
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    Some(age)
}
