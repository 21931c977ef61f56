//! Document requests: clearances and certificates issued to residents.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::required;

/// Kind of document a resident can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// General barangay clearance.
    BarangayClearance,
    /// Proof of residency.
    CertificateOfResidency,
    /// Proof of low income, for assistance programs.
    CertificateOfIndigency,
    /// Clearance to operate a business in the barangay.
    BusinessClearance,
}

impl DocumentType {
    /// All document types, in display order.
    pub const ALL: [Self; 4] = [
        Self::BarangayClearance,
        Self::CertificateOfResidency,
        Self::CertificateOfIndigency,
        Self::BusinessClearance,
    ];

    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BarangayClearance => "barangay_clearance",
            Self::CertificateOfResidency => "certificate_of_residency",
            Self::CertificateOfIndigency => "certificate_of_indigency",
            Self::BusinessClearance => "business_clearance",
        }
    }

    /// Control number prefix.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::BarangayClearance => "BC",
            Self::CertificateOfResidency => "COR",
            Self::CertificateOfIndigency => "COI",
            Self::BusinessClearance => "BUS",
        }
    }

    /// Heading printed on the certificate.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::BarangayClearance => "BARANGAY CLEARANCE",
            Self::CertificateOfResidency => "CERTIFICATE OF RESIDENCY",
            Self::CertificateOfIndigency => "CERTIFICATE OF INDIGENCY",
            Self::BusinessClearance => "BARANGAY BUSINESS CLEARANCE",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::validation(format!("unknown document type: {s}")))
    }
}

/// Processing status of a document request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Waiting for review.
    #[default]
    Pending,
    /// Reviewed and ready for printing.
    Approved,
    /// Turned down.
    Rejected,
    /// Handed to the resident.
    Released,
}

impl DocumentStatus {
    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Released => "released",
        }
    }

    /// Whether a request in this status may move to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected) | (Self::Approved, Self::Released)
        )
    }

    /// Fail unless the transition to `next` is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] for any other move.
    pub fn ensure_transition(self, next: Self) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(Error::invalid_transition("document", self, next))
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "released" => Ok(Self::Released),
            other => Err(Error::validation(format!(
                "unknown document status: {other}"
            ))),
        }
    }
}

/// A document request and its issuance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    /// Row id (assigned by storage).
    pub id: i64,
    /// Printed control number, e.g. `BC-2026-00001`.
    pub control_number: String,
    /// Requesting resident.
    pub resident_code: String,
    /// Kind of document.
    pub document_type: DocumentType,
    /// Stated purpose, printed on the document.
    pub purpose: String,
    /// Processing status.
    pub status: DocumentStatus,
    /// Fee charged, in centavos.
    pub fee_centavos: i64,
    /// Reviewer remarks (required when rejecting).
    pub remarks: Option<String>,
    /// Username of the staff member who last processed the request.
    pub processed_by: Option<String>,
    /// When the request was filed.
    pub requested_at: DateTime<Utc>,
    /// When the request was approved or rejected.
    pub processed_at: Option<DateTime<Utc>>,
    /// When the document was released.
    pub released_at: Option<DateTime<Utc>>,
    /// Last day the released document is valid.
    pub valid_until: Option<NaiveDate>,
}

/// Input for requesting a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocumentRequest {
    /// Requesting resident's code.
    pub resident_code: String,
    /// Kind of document.
    pub document_type: DocumentType,
    /// Stated purpose.
    pub purpose: String,
}

impl NewDocumentRequest {
    /// Trim and validate.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a field is blank.
    pub fn normalized(&self) -> Result<Self> {
        Ok(Self {
            resident_code: required("resident_code", &self.resident_code)?,
            document_type: self.document_type,
            purpose: required("purpose", &self.purpose)?,
        })
    }
}

/// Filters for listing document requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentFilter {
    /// Processing status.
    pub status: Option<DocumentStatus>,
    /// Kind of document.
    pub document_type: Option<DocumentType>,
    /// Requesting resident.
    pub resident_code: Option<String>,
    /// Page size.
    pub limit: Option<usize>,
    /// Rows to skip.
    pub offset: Option<usize>,
}
