//! Animal domain model.
//!
//! # Responsibility
//! - Define the canonical animal record and its lifecycle enums.
//! - Enforce the gender/animal-type constraint and cost invariants.
//!
//! # Invariants
//! - `id` is user-supplied and unique across the animals collection.
//! - `status` is maintained only by coordinator protocols (sale, death,
//!   sale deletion); the model never derives it.
//! - `purchase_cost` is always >= 0 and forced to 0 for birth additions.

use super::{deserialize_optional_date, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Species kept by the operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimalType {
    #[default]
    Sheep,
    Goat,
}

impl Display for AnimalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sheep => write!(f, "sheep"),
            Self::Goat => write!(f, "goat"),
        }
    }
}

/// Gender classes across both species. Stored capitalized (`Ewe`, `Ram`, ...)
/// to match the persisted legacy shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Ewe,
    Ram,
    Lamb,
    Doe,
    Buck,
    Kid,
    Wether,
}

impl Gender {
    /// Whether this gender class belongs to the given species.
    /// Wether applies to castrated males of either species.
    pub fn is_valid_for(self, animal_type: AnimalType) -> bool {
        match self {
            Self::Ewe | Self::Ram | Self::Lamb => animal_type == AnimalType::Sheep,
            Self::Doe | Self::Buck | Self::Kid => animal_type == AnimalType::Goat,
            Self::Wether => true,
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ewe => "Ewe",
            Self::Ram => "Ram",
            Self::Lamb => "Lamb",
            Self::Doe => "Doe",
            Self::Buck => "Buck",
            Self::Kid => "Kid",
            Self::Wether => "Wether",
        };
        write!(f, "{name}")
    }
}

/// Lifecycle status. Transitions are owned by the coordinator:
/// sale -> `Sold`, sale deletion -> `Active`, death record -> `Dead`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimalStatus {
    #[default]
    Active,
    Sold,
    Dead,
}

impl Display for AnimalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Sold => write!(f, "sold"),
            Self::Dead => write!(f, "dead"),
        }
    }
}

/// How the animal entered the operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdditionType {
    #[default]
    Purchase,
    Birth,
}

/// Canonical animal record.
///
/// Serialized field names are camelCase; snake_case aliases accept records
/// written by the legacy storage layer and are rewritten on the next save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub id: String,
    #[serde(default, alias = "animal_type")]
    pub animal_type: AnimalType,
    pub gender: Gender,
    #[serde(
        default,
        alias = "birth_date",
        deserialize_with = "deserialize_optional_date"
    )]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, alias = "purchase_cost")]
    pub purchase_cost: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: AnimalStatus,
    #[serde(default, alias = "addition_type")]
    pub addition_type: AdditionType,
    #[serde(
        default,
        alias = "date_added",
        deserialize_with = "deserialize_optional_date"
    )]
    pub date_added: Option<NaiveDate>,
    /// Fields this version does not recognize; carried through round trips.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Animal {
    /// Fills defaults so every consumer sees the canonical shape.
    ///
    /// # Invariants
    /// - Idempotent: `a.normalized(d).normalized(d) == a.normalized(d)`.
    /// - Birth additions always carry `purchase_cost == 0`.
    /// - Non-finite or negative persisted costs collapse to 0 (legacy data).
    pub fn normalized(mut self, today: NaiveDate) -> Self {
        if self.addition_type == AdditionType::Birth
            || !self.purchase_cost.is_finite()
            || self.purchase_cost < 0.0
        {
            self.purchase_cost = 0.0;
        }
        if self.date_added.is_none() {
            self.date_added = Some(today);
        }
        self
    }

    /// Rejects records that must not reach persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if !self.gender.is_valid_for(self.animal_type) {
            return Err(ValidationError::GenderMismatch {
                gender: self.gender,
                animal_type: self.animal_type,
            });
        }
        if !self.purchase_cost.is_finite() || self.purchase_cost < 0.0 {
            return Err(ValidationError::InvalidPurchaseCost(self.purchase_cost));
        }
        Ok(())
    }
}
