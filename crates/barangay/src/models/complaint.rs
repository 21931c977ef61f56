//! Complaints (blotter entries) filed at the barangay hall.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::{not_in_future, optional, required};

/// Nature of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintCategory {
    /// Noise disturbance.
    Noise,
    /// Dispute between neighbors or relatives.
    Dispute,
    /// Boundary, damage or trespass.
    Property,
    /// Threats to public safety.
    PublicSafety,
    /// Anything else.
    #[default]
    Other,
}

impl ComplaintCategory {
    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Noise => "noise",
            Self::Dispute => "dispute",
            Self::Property => "property",
            Self::PublicSafety => "public_safety",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ComplaintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "noise" => Ok(Self::Noise),
            "dispute" => Ok(Self::Dispute),
            "property" => Ok(Self::Property),
            "public_safety" => Ok(Self::PublicSafety),
            "other" => Ok(Self::Other),
            other => Err(Error::validation(format!(
                "unknown complaint category: {other}"
            ))),
        }
    }
}

/// Case status of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    /// Recorded, not yet acted on.
    #[default]
    Filed,
    /// Parties summoned for mediation.
    UnderMediation,
    /// Settled.
    Resolved,
    /// Dropped or out of jurisdiction.
    Dismissed,
}

impl ComplaintStatus {
    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filed => "filed",
            Self::UnderMediation => "under_mediation",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }

    /// Whether the case is still open.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Filed | Self::UnderMediation)
    }

    /// Whether a case in this status may move to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Filed, Self::UnderMediation | Self::Dismissed)
                | (Self::UnderMediation, Self::Resolved | Self::Dismissed)
        )
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "filed" => Ok(Self::Filed),
            "under_mediation" => Ok(Self::UnderMediation),
            "resolved" => Ok(Self::Resolved),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(Error::validation(format!(
                "unknown complaint status: {other}"
            ))),
        }
    }
}

/// A complaint on file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complaint {
    /// Row id.
    pub id: i64,
    /// Case number, e.g. `CMP-2026-0001`.
    pub case_number: String,
    /// Name of the person filing.
    pub complainant_name: String,
    /// Resident code of the complainant, when they are a registered resident.
    pub complainant_resident_code: Option<String>,
    /// Name of the person complained about.
    pub respondent_name: String,
    /// Nature of the complaint.
    pub category: ComplaintCategory,
    /// Narrative.
    pub description: String,
    /// When the incident happened.
    pub incident_date: NaiveDate,
    /// Where the incident happened.
    pub location: Option<String>,
    /// Case status.
    pub status: ComplaintStatus,
    /// Outcome notes.
    pub resolution: Option<String>,
    /// When the complaint was filed.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Input for filing a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComplaint {
    /// Name of the person filing.
    pub complainant_name: String,
    /// Resident code of the complainant.
    #[serde(default)]
    pub complainant_resident_code: Option<String>,
    /// Name of the person complained about.
    pub respondent_name: String,
    /// Nature of the complaint.
    #[serde(default)]
    pub category: ComplaintCategory,
    /// Narrative.
    pub description: String,
    /// When the incident happened.
    pub incident_date: NaiveDate,
    /// Where the incident happened.
    #[serde(default)]
    pub location: Option<String>,
}

impl NewComplaint {
    /// Trim and validate.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank names or description, or an
    /// incident date in the future.
    pub fn normalized(&self, today: NaiveDate) -> Result<Self> {
        let normalized = Self {
            complainant_name: required("complainant_name", &self.complainant_name)?,
            complainant_resident_code: optional(self.complainant_resident_code.as_deref()),
            respondent_name: required("respondent_name", &self.respondent_name)?,
            category: self.category,
            description: required("description", &self.description)?,
            incident_date: self.incident_date,
            location: optional(self.location.as_deref()),
        };
        not_in_future("incident_date", normalized.incident_date, today)?;
        Ok(normalized)
    }
}

/// A requested status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintTransition {
    /// Target status.
    pub status: ComplaintStatus,
    /// Outcome notes; required when resolving.
    #[serde(default)]
    pub resolution: Option<String>,
}

impl ComplaintTransition {
    /// Validate this change against the current status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] for a disallowed move, or a
    /// validation error when resolving without notes.
    pub fn check(&self, current: ComplaintStatus) -> Result<Option<String>> {
        if !current.can_transition_to(self.status) {
            return Err(Error::invalid_transition("complaint", current, self.status));
        }
        let resolution = optional(self.resolution.as_deref());
        if self.status == ComplaintStatus::Resolved && resolution.is_none() {
            return Err(Error::validation("resolution is required to resolve a complaint"));
        }
        Ok(resolution)
    }
}

/// Filters for listing complaints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplaintFilter {
    /// Case status.
    pub status: Option<ComplaintStatus>,
    /// Nature of the complaint.
    pub category: Option<ComplaintCategory>,
    /// Substring match on case number or party names.
    pub search: Option<String>,
    /// Page size.
    pub limit: Option<usize>,
    /// Rows to skip.
    pub offset: Option<usize>,
}
