//! Financial transaction model.
//!
//! # Invariants
//! - `id` is system-generated (timestamp-derived) and unique in its collection.
//! - A sale must reference an animal; purchases and expenses may not.
//! - `amount` is always >= 0.

use super::{deserialize_optional_date, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Purchase,
    Expense,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sale => write!(f, "sale"),
            Self::Purchase => write!(f, "purchase"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

/// Canonical transaction record. `kind` persists under the legacy name `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default, alias = "sheep_id")]
    pub sheep_id: Option<String>,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
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

impl Transaction {
    /// Fills defaults; idempotent.
    pub fn normalized(mut self, today: NaiveDate) -> Self {
        if let Some(reference) = &self.sheep_id {
            if reference.trim().is_empty() {
                self.sheep_id = None;
            }
        }
        if self.date_added.is_none() {
            self.date_added = Some(today);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(ValidationError::InvalidAmount(self.amount));
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if self.kind == TransactionType::Sale
            && self.sheep_id.as_deref().map_or(true, |id| id.trim().is_empty())
        {
            return Err(ValidationError::MissingSaleAnimal);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: TransactionType) -> Transaction {
        Transaction {
            id: "1700000000000".to_string(),
            kind,
            sheep_id: Some("S-001".to_string()),
            amount: 150.0,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            description: "market day".to_string(),
            date_added: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn sale_without_animal_reference_is_rejected() {
        let mut sale = sample(TransactionType::Sale);
        sale.sheep_id = None;
        assert_eq!(sale.validate(), Err(ValidationError::MissingSaleAnimal));

        sale.sheep_id = Some("  ".to_string());
        assert_eq!(sale.validate(), Err(ValidationError::MissingSaleAnimal));
    }

    #[test]
    fn expense_without_animal_reference_is_fine() {
        let mut expense = sample(TransactionType::Expense);
        expense.sheep_id = None;
        assert!(expense.validate().is_ok());
    }

    #[test]
    fn blank_reference_normalizes_to_none() {
        let mut expense = sample(TransactionType::Expense);
        expense.sheep_id = Some(String::new());
        let normalized = expense.normalized(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(normalized.sheep_id, None);
        assert!(normalized.date_added.is_some());
    }

    #[test]
    fn kind_persists_under_legacy_type_name() {
        let value = serde_json::to_value(sample(TransactionType::Purchase)).unwrap();
        assert_eq!(value["type"], "purchase");
        assert_eq!(value["sheepId"], "S-001");
    }
}
