//! Error types for barangay.
//!
//! This module defines all error types used throughout the barangay crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for barangay operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Record Errors ===
    /// A record could not be found.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record (e.g. "resident").
        entity: &'static str,
        /// The code or id that was looked up.
        key: String,
    },

    /// A record with the same identity already exists.
    #[error("duplicate {entity}: {message}")]
    Duplicate {
        /// Kind of record.
        entity: &'static str,
        /// Which existing record collides.
        message: String,
    },

    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request could not be read at all.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A status change is not allowed from the current status.
    #[error("cannot move {entity} from {from} to {to}")]
    InvalidTransition {
        /// Kind of record.
        entity: &'static str,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    // === Auth Errors ===
    /// Username or password did not match, or the account is inactive.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed or expired token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is authenticated but lacks the required role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The one-time code is wrong, used up, or exhausted its attempts.
    #[error("invalid one-time code")]
    OtpInvalid,

    /// The one-time code has expired.
    #[error("one-time code expired")]
    OtpExpired,

    // === Mail Errors ===
    /// A message could not be delivered.
    #[error("failed to send mail to {to}: {message}")]
    Mail {
        /// Recipient address.
        to: String,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for barangay operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a not-found error for the given record kind and key.
    #[must_use]
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Create a duplicate-record error.
    #[must_use]
    pub fn duplicate(entity: &'static str, message: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            message: message.into(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid status transition error.
    #[must_use]
    pub fn invalid_transition(
        entity: &'static str,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Create a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means a record was missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is an authentication or authorization failure.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::Unauthorized(_)
                | Self::Forbidden(_)
                | Self::OtpInvalid
                | Self::OtpExpired
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("resident", "RES-2026-0001");
        assert_eq!(err.to_string(), "resident not found: RES-2026-0001");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_duplicate_display() {
        let err = Error::duplicate("resident", "already registered as RES-2026-0004");
        let msg = err.to_string();
        assert!(msg.contains("duplicate resident"));
        assert!(msg.contains("RES-2026-0004"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = Error::invalid_transition("document", "released", "approved");
        assert_eq!(
            err.to_string(),
            "cannot move document from released to approved"
        );
    }

    #[test]
    fn test_is_auth_error() {
        assert!(Error::InvalidCredentials.is_auth_error());
        assert!(Error::unauthorized("missing token").is_auth_error());
        assert!(Error::forbidden("admin only").is_auth_error());
        assert!(Error::OtpExpired.is_auth_error());
        assert!(!Error::validation("bad").is_auth_error());
        assert!(!Error::not_found("household", "HH-0001").is_auth_error());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("lock poisoned");
        assert_eq!(err.to_string(), "internal error: lock poisoned");
    }

    #[test]
    fn test_mail_error_display() {
        let err = Error::Mail {
            to: "clerk@example.org".to_string(),
            message: "relay refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("clerk@example.org"));
        assert!(msg.contains("relay refused"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "port must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("port must be greater than 0"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
