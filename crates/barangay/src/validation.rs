//! Input validation for record fields.
//!
//! Field checks shared by residents, complaints and accounts. Each check
//! returns [`Error::Validation`] naming the offending field.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{Error, Result};

/// A compiled field pattern.
#[derive(Debug)]
pub struct FieldPattern {
    /// Name of the field this pattern validates.
    pub field: &'static str,

    /// Human-readable description of the expected shape.
    pub description: &'static str,

    regex: Regex,
}

impl FieldPattern {
    /// Create a new field pattern.
    ///
    /// # Panics
    ///
    /// Panics if the regex pattern is invalid.
    #[must_use]
    pub fn new(field: &'static str, description: &'static str, pattern: &str) -> Self {
        Self {
            field,
            description,
            regex: Regex::new(pattern).expect("Invalid regex pattern"),
        }
    }

    /// Check if the value matches this pattern.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Validate a value, producing an error that names the field.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the value does not match.
    pub fn check(&self, value: &str) -> Result<()> {
        if self.matches(value) {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "{} must be {}",
                self.field, self.description
            )))
        }
    }
}

/// Pattern for contact numbers: optional leading `+`, 7 to 15 digits.
pub fn contact_number_pattern() -> &'static FieldPattern {
    static PATTERN: OnceLock<FieldPattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        FieldPattern::new(
            "contact_number",
            "7 to 15 digits with an optional leading +",
            r"^\+?[0-9]{7,15}$",
        )
    })
}

/// Pattern for email addresses.
pub fn email_pattern() -> &'static FieldPattern {
    static PATTERN: OnceLock<FieldPattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        FieldPattern::new(
            "email",
            "a valid email address",
            r"^[^@\s]+@[^@\s]+\.[^@\s]+$",
        )
    })
}

/// Pattern for account usernames.
pub fn username_pattern() -> &'static FieldPattern {
    static PATTERN: OnceLock<FieldPattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        FieldPattern::new(
            "username",
            "3 to 32 lowercase letters, digits, '_' or '.'",
            r"^[a-z0-9_.]{3,32}$",
        )
    })
}

/// Require a non-blank value and return it trimmed.
///
/// # Errors
///
/// Returns a validation error if the value is empty after trimming.
pub fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional value, mapping blank strings to `None`.
#[must_use]
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Reject dates after `today`.
///
/// # Errors
///
/// Returns a validation error if `date` is in the future.
pub fn not_in_future(field: &str, date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date > today {
        return Err(Error::validation(format!("{field} cannot be in the future")));
    }
    Ok(())
}
