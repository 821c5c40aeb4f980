//! Health event model.
//!
//! # Invariants
//! - Every record references an existing animal at creation time; a later
//!   animal deletion may orphan it, by design.
//! - A `Death` record is the only path that marks an animal dead.

use super::{deserialize_optional_date, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthRecordType {
    Weight,
    Medication,
    Vaccination,
    Death,
    Other,
}

/// Canonical health record. `kind` persists under the legacy name `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub id: String,
    #[serde(alias = "sheep_id")]
    pub sheep_id: String,
    #[serde(rename = "type")]
    pub kind: HealthRecordType,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub medication: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
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

impl HealthRecord {
    /// Fills defaults; idempotent.
    pub fn normalized(mut self, today: NaiveDate) -> Self {
        if self.date_added.is_none() {
            self.date_added = Some(today);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.sheep_id.trim().is_empty() {
            return Err(ValidationError::EmptyAnimalReference);
        }
        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ValidationError::InvalidWeight(weight));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HealthRecord {
        HealthRecord {
            id: "1700000000001".to_string(),
            sheep_id: "S-001".to_string(),
            kind: HealthRecordType::Weight,
            weight: Some(42.5),
            medication: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            notes: String::new(),
            date_added: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut record = sample();
        record.weight = Some(-1.0);
        assert_eq!(record.validate(), Err(ValidationError::InvalidWeight(-1.0)));
    }

    #[test]
    fn missing_animal_reference_is_rejected() {
        let mut record = sample();
        record.sheep_id = " ".to_string();
        assert_eq!(record.validate(), Err(ValidationError::EmptyAnimalReference));
    }

    #[test]
    fn legacy_sheep_id_alias_deserializes() {
        let raw = serde_json::json!({
            "id": "1",
            "sheep_id": "S-009",
            "type": "vaccination",
            "date": "2024-02-02"
        });
        let record: HealthRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.sheep_id, "S-009");
        assert_eq!(record.kind, HealthRecordType::Vaccination);
        assert_eq!(record.weight, None);
    }
}
