//! Domain model for farm records.
//!
//! # Responsibility
//! - Define the canonical shapes for animals, transactions and health records.
//! - Provide validation and normalization so every consumer sees one shape.
//!
//! # Invariants
//! - Canonical JSON field names are camelCase; legacy snake_case names are
//!   accepted on read and rewritten to canonical on the next save.
//! - Normalization is idempotent: applying it twice equals applying it once.
//! - Unrecognized persisted fields are carried through, never dropped.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod animal;
pub mod health;
pub mod transaction;

pub use animal::{AdditionType, Animal, AnimalStatus, AnimalType, Gender};
pub use health::{HealthRecord, HealthRecordType};
pub use transaction::{Transaction, TransactionType};

/// Field-level validation failure for any farm record.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Record id is empty after trim.
    EmptyId,
    /// Gender is not valid for the animal type.
    GenderMismatch {
        gender: Gender,
        animal_type: AnimalType,
    },
    /// Purchase cost is negative or not finite.
    InvalidPurchaseCost(f64),
    /// Transaction amount is negative or not finite.
    InvalidAmount(f64),
    /// Transaction description is empty after trim.
    EmptyDescription,
    /// Sale transaction carries no animal reference.
    MissingSaleAnimal,
    /// Health record animal reference is empty after trim.
    EmptyAnimalReference,
    /// Recorded weight is negative or not finite.
    InvalidWeight(f64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "record id must not be empty"),
            Self::GenderMismatch {
                gender,
                animal_type,
            } => write!(f, "gender {gender} is not valid for animal type {animal_type}"),
            Self::InvalidPurchaseCost(value) => {
                write!(f, "purchase cost must be a non-negative number, got {value}")
            }
            Self::InvalidAmount(value) => {
                write!(f, "amount must be a non-negative number, got {value}")
            }
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::MissingSaleAnimal => write!(f, "sale transaction requires an animal id"),
            Self::EmptyAnimalReference => write!(f, "animal reference must not be empty"),
            Self::InvalidWeight(value) => {
                write!(f, "weight must be a non-negative number, got {value}")
            }
        }
    }
}

impl Error for ValidationError {}

/// Current local calendar date, used as the `dateAdded` default.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Accepts ISO dates, `null` and the empty string legacy forms for optional
/// date fields. Empty string appears in records written by old form handlers.
pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
