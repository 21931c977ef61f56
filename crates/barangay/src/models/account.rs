//! Staff and admin accounts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::{email_pattern, username_pattern};

/// What an account is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including account management and deletes.
    Admin,
    /// Day-to-day records work.
    #[default]
    Staff,
}

impl Role {
    /// Stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }

    /// Whether this role is admin.
    #[must_use]
    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            other => Err(Error::validation(format!("unknown role: {other}"))),
        }
    }
}

/// An account that can sign in to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Row id.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Email for password resets.
    pub email: String,
    /// Role.
    pub role: Role,
    /// Inactive accounts cannot sign in.
    pub active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Last successful sign-in.
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewAccount {
    /// Login name.
    pub username: String,
    /// Email.
    pub email: String,
    /// Plain-text password; hashed before storage.
    pub password: String,
    /// Role.
    #[serde(default)]
    pub role: Role,
}

impl NewAccount {
    /// Normalize username and email and validate all fields.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad username, email, or a password
    /// shorter than `min_password_length`.
    pub fn normalized(&self, min_password_length: usize) -> Result<Self> {
        let username = self.username.trim().to_lowercase();
        let email = self.email.trim().to_lowercase();
        username_pattern().check(&username)?;
        email_pattern().check(&email)?;
        check_password(&self.password, min_password_length)?;
        Ok(Self {
            username,
            email,
            password: self.password.clone(),
            role: self.role,
        })
    }
}

/// Enforce the minimum password length.
///
/// # Errors
///
/// Returns a validation error if the password is too short.
pub fn check_password(password: &str, min_length: usize) -> Result<()> {
    if password.chars().count() < min_length {
        return Err(Error::validation(format!(
            "password must be at least {min_length} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewAccount {
        NewAccount {
            username: " Secretary_01 ".to_string(),
            email: "Sec@Barangay.PH".to_string(),
            password: "correct horse".to_string(),
            role: Role::Staff,
        }
    }

    #[test]
    fn test_normalized_lowercases() {
        let account = input().normalized(8).unwrap();
        assert_eq!(account.username, "secretary_01");
        assert_eq!(account.email, "sec@barangay.ph");
    }

    #[test]
    fn test_normalized_rejects_short_password() {
        let mut account = input();
        account.password = "short".to_string();
        let err = account.normalized(8).unwrap_err().to_string();
        assert!(err.contains("at least 8"));
    }

    #[test]
    fn test_normalized_rejects_bad_username() {
        let mut account = input();
        account.username = "a b".to_string();
        assert!(account.normalized(8).is_err());
    }

    #[test]
    fn test_role_parse_and_default() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::default(), Role::Staff);
        assert!(Role::Admin.is_admin());
        assert!(!Role::Staff.is_admin());
    }
}
