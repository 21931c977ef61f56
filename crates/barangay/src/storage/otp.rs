//! One-time code records.
//!
//! Each account has at most one outstanding code; storing a new one replaces
//! the old one. Only a hash of the code is kept.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::error::Result;

use super::{column_timestamp, format_timestamp, Storage};

/// A stored one-time code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    /// Account the code was issued to.
    pub account_id: i64,
    /// Hash of the code.
    pub code_hash: String,
    /// When the code stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// Failed verification attempts so far.
    pub attempts: u32,
    /// Whether the code has been used.
    pub consumed: bool,
    /// When the code was issued.
    pub created_at: DateTime<Utc>,
}

impl Storage {
    /// Store a new code for an account, replacing any outstanding one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn put_otp(
        &self,
        account_id: i64,
        code_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            r"
            INSERT OR REPLACE INTO otp_codes
                (account_id, code_hash, expires_at, attempts, consumed, created_at)
            VALUES (?1, ?2, ?3, 0, 0, ?4)
            ",
            params![
                account_id,
                code_hash,
                format_timestamp(expires_at),
                format_timestamp(now)
            ],
        )?;
        debug!("Stored one-time code for account {}", account_id);
        Ok(())
    }

    /// The outstanding code for an account, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_otp(&self, account_id: i64) -> Result<Option<OtpRecord>> {
        let record = self
            .conn
            .query_row(
                r"
                SELECT account_id, code_hash, expires_at, attempts, consumed, created_at
                FROM otp_codes WHERE account_id = ?1
                ",
                [account_id],
                |row| {
                    Ok(OtpRecord {
                        account_id: row.get(0)?,
                        code_hash: row.get(1)?,
                        expires_at: column_timestamp(row, 2)?,
                        attempts: row.get(3)?,
                        consumed: row.get(4)?,
                        created_at: column_timestamp(row, 5)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Count a failed verification attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn record_otp_attempt(&self, account_id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE otp_codes SET attempts = attempts + 1 WHERE account_id = ?1",
            [account_id],
        )?;
        Ok(())
    }

    /// Mark the account's code as used.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn consume_otp(&self, account_id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE otp_codes SET consumed = 1 WHERE account_id = ?1",
            [account_id],
        )?;
        debug!("Consumed one-time code for account {}", account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::storage;
    use super::*;
    use crate::models::{NewAccount, Role};
    use chrono::Duration;

    fn account_id(storage: &Storage) -> i64 {
        let input = NewAccount {
            username: "clerk".to_string(),
            email: "clerk@barangay.ph".to_string(),
            password: String::new(),
            role: Role::Staff,
        };
        storage.create_account(&input, "h").unwrap().id
    }

    #[test]
    fn test_put_and_get() {
        let storage = storage();
        let id = account_id(&storage);
        let now = Utc::now();

        assert!(storage.get_otp(id).unwrap().is_none());
        storage
            .put_otp(id, "hash-1", now + Duration::minutes(10), now)
            .unwrap();

        let record = storage.get_otp(id).unwrap().unwrap();
        assert_eq!(record.code_hash, "hash-1");
        assert_eq!(record.attempts, 0);
        assert!(!record.consumed);
    }

    #[test]
    fn test_new_code_replaces_old() {
        let storage = storage();
        let id = account_id(&storage);
        let now = Utc::now();

        storage
            .put_otp(id, "hash-1", now + Duration::minutes(10), now)
            .unwrap();
        storage.record_otp_attempt(id).unwrap();
        storage.consume_otp(id).unwrap();
        storage
            .put_otp(id, "hash-2", now + Duration::minutes(10), now)
            .unwrap();

        let record = storage.get_otp(id).unwrap().unwrap();
        assert_eq!(record.code_hash, "hash-2");
        assert_eq!(record.attempts, 0);
        assert!(!record.consumed);
    }

    #[test]
    fn test_attempts_and_consume() {
        let storage = storage();
        let id = account_id(&storage);
        let now = Utc::now();
        storage
            .put_otp(id, "hash", now + Duration::minutes(10), now)
            .unwrap();

        storage.record_otp_attempt(id).unwrap();
        storage.record_otp_attempt(id).unwrap();
        storage.consume_otp(id).unwrap();

        let record = storage.get_otp(id).unwrap().unwrap();
        assert_eq!(record.attempts, 2);
        assert!(record.consumed);
    }
}
