//! Resident records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::{
    contact_number_pattern, email_pattern, not_in_future, optional, required,
};

/// Age at which a resident counts as a senior citizen.
pub const SENIOR_AGE: u32 = 60;

/// Sex as recorded on the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    /// Male.
    Male,
    /// Female.
    Female,
}

impl Sex {
    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(Error::validation(format!("unknown sex: {other}"))),
        }
    }
}

/// Civil status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CivilStatus {
    /// Never married.
    Single,
    /// Married.
    Married,
    /// Spouse deceased.
    Widowed,
    /// Legally or de facto separated.
    Separated,
}

impl CivilStatus {
    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Married => "married",
            Self::Widowed => "widowed",
            Self::Separated => "separated",
        }
    }
}

impl fmt::Display for CivilStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CivilStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(Self::Single),
            "married" => Ok(Self::Married),
            "widowed" => Ok(Self::Widowed),
            "separated" => Ok(Self::Separated),
            other => Err(Error::validation(format!("unknown civil status: {other}"))),
        }
    }
}

/// Whether a resident still lives in the barangay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidentStatus {
    /// Currently residing.
    #[default]
    Active,
    /// Transferred out.
    Moved,
    /// Deceased.
    Deceased,
}

impl ResidentStatus {
    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Moved => "moved",
            Self::Deceased => "deceased",
        }
    }
}

impl fmt::Display for ResidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResidentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "moved" => Ok(Self::Moved),
            "deceased" => Ok(Self::Deceased),
            other => Err(Error::validation(format!(
                "unknown resident status: {other}"
            ))),
        }
    }
}

/// A registered resident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    /// Row id (assigned by storage).
    pub id: i64,
    /// Public resident code, e.g. `RES-2026-0001`.
    pub resident_code: String,
    /// Given name.
    pub first_name: String,
    /// Middle name.
    pub middle_name: Option<String>,
    /// Surname.
    pub last_name: String,
    /// Name suffix such as "Jr." or "III".
    pub suffix: Option<String>,
    /// Date of birth.
    pub birth_date: NaiveDate,
    /// Sex.
    pub sex: Sex,
    /// Civil status.
    pub civil_status: CivilStatus,
    /// Purok (zone) within the barangay.
    pub purok: String,
    /// Street address.
    pub address: String,
    /// Mobile or landline number.
    pub contact_number: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Occupation.
    pub occupation: Option<String>,
    /// Registered voter in this barangay.
    pub is_voter: bool,
    /// Person with disability.
    pub is_pwd: bool,
    /// Household this resident belongs to.
    pub household_code: Option<String>,
    /// Residency status.
    pub status: ResidentStatus,
    /// Hash used to detect duplicate registrations.
    pub identity_key: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Resident {
    /// Full display name, e.g. `Juan S. Dela Cruz Jr.`.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut name = self.first_name.clone();
        if let Some(middle) = self.middle_name.as_deref().and_then(|m| m.chars().next()) {
            name.push(' ');
            name.push(middle);
            name.push('.');
        }
        name.push(' ');
        name.push_str(&self.last_name);
        if let Some(suffix) = &self.suffix {
            name.push(' ');
            name.push_str(suffix);
        }
        name
    }

    /// Age in completed years on the given date.
    #[must_use]
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        age_on(self.birth_date, date)
    }

    /// Whether the resident is a senior citizen on the given date.
    #[must_use]
    pub fn is_senior_on(&self, date: NaiveDate) -> bool {
        self.age_on(date) >= SENIOR_AGE
    }
}

/// Age in completed years of someone born on `birth_date`, as of `date`.
#[must_use]
pub fn age_on(birth_date: NaiveDate, date: NaiveDate) -> u32 {
    if date < birth_date {
        return 0;
    }
    let mut years = date.year() - birth_date.year();
    if (date.month(), date.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

/// Compute the identity key for a person.
///
/// Names are trimmed, lowercased and have internal whitespace collapsed, so
/// `" Dela  Cruz"` and `"dela cruz"` produce the same key.
#[must_use]
pub fn identity_key(
    first_name: &str,
    middle_name: Option<&str>,
    last_name: &str,
    birth_date: NaiveDate,
) -> String {
    let normalize = |s: &str| {
        s.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    };
    let material = format!(
        "{}|{}|{}|{}",
        normalize(last_name),
        normalize(first_name),
        normalize(middle_name.unwrap_or_default()),
        birth_date.format("%Y-%m-%d"),
    );
    blake3::hash(material.as_bytes()).to_hex().to_string()
}

/// Input for registering a resident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResident {
    /// Given name.
    pub first_name: String,
    /// Middle name.
    #[serde(default)]
    pub middle_name: Option<String>,
    /// Surname.
    pub last_name: String,
    /// Name suffix.
    #[serde(default)]
    pub suffix: Option<String>,
    /// Date of birth.
    pub birth_date: NaiveDate,
    /// Sex.
    pub sex: Sex,
    /// Civil status.
    pub civil_status: CivilStatus,
    /// Purok.
    pub purok: String,
    /// Street address.
    pub address: String,
    /// Contact number.
    #[serde(default)]
    pub contact_number: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Occupation.
    #[serde(default)]
    pub occupation: Option<String>,
    /// Registered voter.
    #[serde(default)]
    pub is_voter: bool,
    /// Person with disability.
    #[serde(default)]
    pub is_pwd: bool,
}

impl NewResident {
    /// Trim every text field and validate the result.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first invalid field.
    pub fn normalized(&self, today: NaiveDate) -> Result<Self> {
        let normalized = Self {
            first_name: required("first_name", &self.first_name)?,
            middle_name: optional(self.middle_name.as_deref()),
            last_name: required("last_name", &self.last_name)?,
            suffix: optional(self.suffix.as_deref()),
            birth_date: self.birth_date,
            sex: self.sex,
            civil_status: self.civil_status,
            purok: required("purok", &self.purok)?,
            address: required("address", &self.address)?,
            contact_number: optional(self.contact_number.as_deref()),
            email: optional(self.email.as_deref()).map(|e| e.to_lowercase()),
            occupation: optional(self.occupation.as_deref()),
            is_voter: self.is_voter,
            is_pwd: self.is_pwd,
        };

        not_in_future("birth_date", normalized.birth_date, today)?;
        if let Some(number) = &normalized.contact_number {
            contact_number_pattern().check(number)?;
        }
        if let Some(email) = &normalized.email {
            email_pattern().check(email)?;
        }
        Ok(normalized)
    }

    /// Identity key for this registration.
    #[must_use]
    pub fn identity_key(&self) -> String {
        identity_key(
            &self.first_name,
            self.middle_name.as_deref(),
            &self.last_name,
            self.birth_date,
        )
    }
}

impl From<&Resident> for NewResident {
    fn from(resident: &Resident) -> Self {
        Self {
            first_name: resident.first_name.clone(),
            middle_name: resident.middle_name.clone(),
            last_name: resident.last_name.clone(),
            suffix: resident.suffix.clone(),
            birth_date: resident.birth_date,
            sex: resident.sex,
            civil_status: resident.civil_status,
            purok: resident.purok.clone(),
            address: resident.address.clone(),
            contact_number: resident.contact_number.clone(),
            email: resident.email.clone(),
            occupation: resident.occupation.clone(),
            is_voter: resident.is_voter,
            is_pwd: resident.is_pwd,
        }
    }
}

/// Partial update of a resident. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidentUpdate {
    /// Given name.
    pub first_name: Option<String>,
    /// Middle name; an empty string clears it.
    pub middle_name: Option<String>,
    /// Surname.
    pub last_name: Option<String>,
    /// Suffix; an empty string clears it.
    pub suffix: Option<String>,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
    /// Sex.
    pub sex: Option<Sex>,
    /// Civil status.
    pub civil_status: Option<CivilStatus>,
    /// Purok.
    pub purok: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Contact number; an empty string clears it.
    pub contact_number: Option<String>,
    /// Email; an empty string clears it.
    pub email: Option<String>,
    /// Occupation; an empty string clears it.
    pub occupation: Option<String>,
    /// Registered voter.
    pub is_voter: Option<bool>,
    /// Person with disability.
    pub is_pwd: Option<bool>,
}

impl ResidentUpdate {
    /// Merge this update over an existing resident's fields.
    #[must_use]
    pub fn apply_to(self, current: &Resident) -> NewResident {
        let mut merged = NewResident::from(current);
        if let Some(v) = self.first_name {
            merged.first_name = v;
        }
        if let Some(v) = self.middle_name {
            merged.middle_name = Some(v);
        }
        if let Some(v) = self.last_name {
            merged.last_name = v;
        }
        if let Some(v) = self.suffix {
            merged.suffix = Some(v);
        }
        if let Some(v) = self.birth_date {
            merged.birth_date = v;
        }
        if let Some(v) = self.sex {
            merged.sex = v;
        }
        if let Some(v) = self.civil_status {
            merged.civil_status = v;
        }
        if let Some(v) = self.purok {
            merged.purok = v;
        }
        if let Some(v) = self.address {
            merged.address = v;
        }
        if let Some(v) = self.contact_number {
            merged.contact_number = Some(v);
        }
        if let Some(v) = self.email {
            merged.email = Some(v);
        }
        if let Some(v) = self.occupation {
            merged.occupation = Some(v);
        }
        if let Some(v) = self.is_voter {
            merged.is_voter = v;
        }
        if let Some(v) = self.is_pwd {
            merged.is_pwd = v;
        }
        merged
    }
}

/// Filters for listing residents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidentFilter {
    /// Substring match on names or resident code.
    pub search: Option<String>,
    /// Exact purok.
    pub purok: Option<String>,
    /// Sex.
    pub sex: Option<Sex>,
    /// Residency status.
    pub status: Option<ResidentStatus>,
    /// Voter flag.
    pub is_voter: Option<bool>,
    /// PWD flag.
    pub is_pwd: Option<bool>,
    /// Members of this household.
    pub household_code: Option<String>,
    /// Only residents aged 60 or over.
    pub seniors_only: bool,
    /// Page size.
    pub limit: Option<usize>,
    /// Rows to skip.
    pub offset: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> NewResident {
        NewResident {
            first_name: " Juan ".to_string(),
            middle_name: Some("Santos".to_string()),
            last_name: "Dela Cruz".to_string(),
            suffix: Some(String::new()),
            birth_date: date(1990, 5, 14),
            sex: Sex::Male,
            civil_status: CivilStatus::Married,
            purok: "Purok 3".to_string(),
            address: "12 Mabini St.".to_string(),
            contact_number: Some("09171234567".to_string()),
            email: Some("Juan@Example.PH".to_string()),
            occupation: None,
            is_voter: true,
            is_pwd: false,
        }
    }

    #[test]
    fn test_enum_round_trip_strings() {
        assert_eq!("female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!(CivilStatus::Widowed.to_string(), "widowed");
        assert_eq!(
            "moved".parse::<ResidentStatus>().unwrap(),
            ResidentStatus::Moved
        );
        assert!("unknown".parse::<CivilStatus>().is_err());
    }

    #[test]
    fn test_age_on_before_and_after_birthday() {
        let birth = date(1966, 10, 20);
        assert_eq!(age_on(birth, date(2026, 10, 19)), 59);
        assert_eq!(age_on(birth, date(2026, 10, 20)), 60);
        assert_eq!(age_on(birth, date(1960, 1, 1)), 0);
    }

    #[test]
    fn test_identity_key_normalizes_names() {
        let a = identity_key("Juan", Some("Santos"), "Dela Cruz", date(1990, 5, 14));
        let b = identity_key(" juan ", Some("SANTOS"), "dela   cruz", date(1990, 5, 14));
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_key_differs_by_birth_date() {
        let a = identity_key("Juan", None, "Dela Cruz", date(1990, 5, 14));
        let b = identity_key("Juan", None, "Dela Cruz", date(1990, 5, 15));
        assert_ne!(a, b);
    }

    #[test]
    fn test_normalized_trims_and_lowercases() {
        let normalized = sample().normalized(date(2026, 10, 19)).unwrap();
        assert_eq!(normalized.first_name, "Juan");
        assert_eq!(normalized.suffix, None);
        assert_eq!(normalized.email.as_deref(), Some("juan@example.ph"));
    }

    #[test]
    fn test_normalized_rejects_future_birth_date() {
        let mut input = sample();
        input.birth_date = date(2030, 1, 1);
        let err = input.normalized(date(2026, 10, 19)).unwrap_err();
        assert!(err.to_string().contains("birth_date"));
    }

    #[test]
    fn test_normalized_rejects_bad_contact_number() {
        let mut input = sample();
        input.contact_number = Some("call me".to_string());
        let err = input.normalized(date(2026, 10, 19)).unwrap_err();
        assert!(err.to_string().contains("contact_number"));
    }

    #[test]
    fn test_normalized_rejects_blank_name() {
        let mut input = sample();
        input.last_name = "  ".to_string();
        assert!(input.normalized(date(2026, 10, 19)).is_err());
    }

    #[test]
    fn test_update_apply_to() {
        let now = Utc::now();
        let base = sample().normalized(date(2026, 10, 19)).unwrap();
        let resident = Resident {
            id: 1,
            resident_code: "RES-2026-0001".to_string(),
            first_name: base.first_name.clone(),
            middle_name: base.middle_name.clone(),
            last_name: base.last_name.clone(),
            suffix: None,
            birth_date: base.birth_date,
            sex: base.sex,
            civil_status: base.civil_status,
            purok: base.purok.clone(),
            address: base.address.clone(),
            contact_number: None,
            email: None,
            occupation: None,
            is_voter: true,
            is_pwd: false,
            household_code: None,
            status: ResidentStatus::Active,
            identity_key: base.identity_key(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(resident.full_name(), "Juan S. Dela Cruz");

        let update = ResidentUpdate {
            civil_status: Some(CivilStatus::Widowed),
            occupation: Some("Farmer".to_string()),
            ..ResidentUpdate::default()
        };
        let merged = update.apply_to(&resident);
        assert_eq!(merged.civil_status, CivilStatus::Widowed);
        assert_eq!(merged.occupation.as_deref(), Some("Farmer"));
        assert_eq!(merged.first_name, "Juan");
    }
}
