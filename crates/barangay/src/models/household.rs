//! Household records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Resident;
use crate::error::Result;
use crate::validation::required;

/// A household: residents sharing one dwelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    /// Row id (assigned by storage).
    pub id: i64,
    /// Public household code, e.g. `HH-0001`.
    pub household_code: String,
    /// Purok.
    pub purok: String,
    /// Street address.
    pub address: String,
    /// Resident code of the household head.
    pub head_resident_code: Option<String>,
    /// Number of residents assigned to this household.
    pub member_count: i64,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub updated_at: DateTime<Utc>,
}

/// A household together with its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdDetail {
    /// The household.
    #[serde(flatten)]
    pub household: Household,
    /// Residents assigned to it.
    pub members: Vec<Resident>,
}

/// Input for creating a household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHousehold {
    /// Purok.
    pub purok: String,
    /// Street address.
    pub address: String,
}

impl NewHousehold {
    /// Trim and validate.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a field is blank.
    pub fn normalized(&self) -> Result<Self> {
        Ok(Self {
            purok: required("purok", &self.purok)?,
            address: required("address", &self.address)?,
        })
    }
}

/// Partial update of a household.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdUpdate {
    /// Purok.
    pub purok: Option<String>,
    /// Street address.
    pub address: Option<String>,
}

impl HouseholdUpdate {
    /// Merge over the current household.
    #[must_use]
    pub fn apply_to(self, current: &Household) -> NewHousehold {
        NewHousehold {
            purok: self.purok.unwrap_or_else(|| current.purok.clone()),
            address: self.address.unwrap_or_else(|| current.address.clone()),
        }
    }
}

/// Filters for listing households.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdFilter {
    /// Exact purok.
    pub purok: Option<String>,
    /// Substring match on code or address.
    pub search: Option<String>,
    /// Page size.
    pub limit: Option<usize>,
    /// Rows to skip.
    pub offset: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_household_normalized() {
        let input = NewHousehold {
            purok: " Purok 1 ".to_string(),
            address: "5 Rizal Ave.".to_string(),
        };
        let normalized = input.normalized().unwrap();
        assert_eq!(normalized.purok, "Purok 1");
    }

    #[test]
    fn test_new_household_requires_address() {
        let input = NewHousehold {
            purok: "Purok 1".to_string(),
            address: String::new(),
        };
        assert!(input.normalized().is_err());
    }

    #[test]
    fn test_update_apply_to_keeps_unset_fields() {
        let now = Utc::now();
        let household = Household {
            id: 1,
            household_code: "HH-0001".to_string(),
            purok: "Purok 1".to_string(),
            address: "5 Rizal Ave.".to_string(),
            head_resident_code: None,
            member_count: 0,
            created_at: now,
            updated_at: now,
        };
        let update = HouseholdUpdate {
            address: Some("7 Rizal Ave.".to_string()),
            ..HouseholdUpdate::default()
        };
        let merged = update.apply_to(&household);
        assert_eq!(merged.purok, "Purok 1");
        assert_eq!(merged.address, "7 Rizal Ave.");
    }
}
