//! Staff accounts.
//!
//! Password hashing happens in [`crate::auth`]; this module only stores and
//! returns the encoded hash.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Account, NewAccount, Role};

use super::{column_enum, column_opt_timestamp, column_timestamp, format_timestamp, Storage};

const SELECT_ACCOUNT: &str = r"
    SELECT id, username, email, role, active, created_at, last_login_at
    FROM accounts
";

impl Storage {
    /// Insert an account with an already-hashed password.
    ///
    /// `input` should already be normalized; its plain-text password is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Duplicate`] if the username or email is taken, or a
    /// database error.
    pub fn create_account(&self, input: &NewAccount, password_hash: &str) -> Result<Account> {
        let tx = self.conn.unchecked_transaction()?;

        let taken: Option<(String, String)> = tx
            .query_row(
                "SELECT username, email FROM accounts WHERE username = ?1 OR email = ?2",
                params![input.username, input.email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        if let Some((username, _)) = taken {
            let message = if username == input.username {
                format!("username {} is taken", input.username)
            } else {
                format!("email {} is already in use", input.email)
            };
            return Err(Error::duplicate("account", message));
        }

        tx.execute(
            r"
            INSERT INTO accounts (username, email, password_hash, role, active, created_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5)
            ",
            params![
                input.username,
                input.email,
                password_hash,
                input.role.as_str(),
                format_timestamp(Utc::now()),
            ],
        )?;
        tx.commit()?;

        info!("Created {} account {}", input.role, input.username);
        self.get_account(&input.username)
    }

    /// Get an account by username.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn get_account(&self, username: &str) -> Result<Account> {
        self.conn
            .query_row(
                &format!("{SELECT_ACCOUNT} WHERE username = ?1"),
                [username],
                row_to_account,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("account", username))
    }

    /// Get an account by row id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn get_account_by_id(&self, id: i64) -> Result<Account> {
        self.conn
            .query_row(
                &format!("{SELECT_ACCOUNT} WHERE id = ?1"),
                [id],
                row_to_account,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("account", id))
    }

    /// Look up an account by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = self
            .conn
            .query_row(
                &format!("{SELECT_ACCOUNT} WHERE email = ?1"),
                [email],
                row_to_account,
            )
            .optional()?;
        Ok(account)
    }

    /// An account together with its stored password hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn account_credentials(&self, username: &str) -> Result<Option<(Account, String)>> {
        let found = self
            .conn
            .query_row(
                r"
                SELECT id, username, email, role, active, created_at, last_login_at, password_hash
                FROM accounts WHERE username = ?1
                ",
                [username],
                |row| Ok((row_to_account(row)?, row.get(7)?)),
            )
            .optional()?;
        Ok(found)
    }

    /// Stored password hash for an account id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn password_hash(&self, account_id: i64) -> Result<String> {
        self.conn
            .query_row(
                "SELECT password_hash FROM accounts WHERE id = ?1",
                [account_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::not_found("account", account_id))
    }

    /// All accounts ordered by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_ACCOUNT} ORDER BY username"))?;
        let accounts = stmt
            .query_map([], row_to_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    /// Enable or disable sign-in for an account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn set_account_active(&self, username: &str, active: bool) -> Result<Account> {
        let changed = self.conn.execute(
            "UPDATE accounts SET active = ?2 WHERE username = ?1",
            params![username, active],
        )?;
        if changed == 0 {
            return Err(Error::not_found("account", username));
        }
        info!(
            "Account {} {}",
            username,
            if active { "activated" } else { "deactivated" }
        );
        self.get_account(username)
    }

    /// Change an account's role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn set_account_role(&self, username: &str, role: Role) -> Result<Account> {
        let changed = self.conn.execute(
            "UPDATE accounts SET role = ?2 WHERE username = ?1",
            params![username, role.as_str()],
        )?;
        if changed == 0 {
            return Err(Error::not_found("account", username));
        }
        info!("Account {} is now {}", username, role);
        self.get_account(username)
    }

    /// Replace an account's password hash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn set_password_hash(&self, account_id: i64, password_hash: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE accounts SET password_hash = ?2 WHERE id = ?1",
            params![account_id, password_hash],
        )?;
        if changed == 0 {
            return Err(Error::not_found("account", account_id));
        }
        info!("Password changed for account {}", account_id);
        Ok(())
    }

    /// Record a successful sign-in.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn record_login(&self, account_id: i64, at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE accounts SET last_login_at = ?2 WHERE id = ?1",
            params![account_id, format_timestamp(at)],
        )?;
        Ok(())
    }
}

fn row_to_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: column_enum(row, 3)?,
        active: row.get(4)?,
        created_at: column_timestamp(row, 5)?,
        last_login_at: column_opt_timestamp(row, 6)?,
    })
}
