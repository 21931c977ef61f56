//! Storage layer for barangay.
//!
//! This module provides `SQLite`-based persistent storage for every record
//! kind. Each submodule adds one group of methods to [`Storage`]:
//!
//! - `residents`: registration with duplicate detection, search, updates
//! - `households`: household records and membership
//! - `documents`: document requests and their status machine
//! - `announcements`: posting plus the publish/archive sweep
//! - `complaints`: complaint filing and case status
//! - `accounts`: staff accounts and password hashes
//! - `otp`: one-time codes for password resets
//!
//! Public codes (`RES-2026-0001`, `HH-0001`, ...) come from [`Sequence`],
//! which reads the highest existing code inside the inserting transaction.

mod accounts;
mod announcements;
mod complaints;
mod documents;
mod households;
pub mod migrations;
mod otp;
mod query;
mod residents;
pub mod schema;
mod sequence;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{types::Type, Connection, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use otp::OtpRecord;
pub use sequence::Sequence;

/// Default page size for list queries.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page size a list query will return.
pub const MAX_PAGE_SIZE: usize = 500;

/// Storage engine for barangay records.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get record counts for the dashboard.
    ///
    /// Senior counts are computed as of `today`; the announcement count
    /// reflects stored status without running the publish/archive sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self, today: NaiveDate) -> Result<RecordStats> {
        let count = |sql: &str| -> Result<i64> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };

        let senior_cutoff = residents::senior_cutoff(today);
        let seniors: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM residents WHERE status = 'active' AND birth_date <= ?1",
            [format_date(senior_cutoff)],
            |row| row.get(0),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(RecordStats {
            residents: count("SELECT COUNT(*) FROM residents WHERE status = 'active'")?,
            male: count(
                "SELECT COUNT(*) FROM residents WHERE status = 'active' AND sex = 'male'",
            )?,
            female: count(
                "SELECT COUNT(*) FROM residents WHERE status = 'active' AND sex = 'female'",
            )?,
            voters: count(
                "SELECT COUNT(*) FROM residents WHERE status = 'active' AND is_voter = 1",
            )?,
            seniors,
            pwd: count("SELECT COUNT(*) FROM residents WHERE status = 'active' AND is_pwd = 1")?,
            households: count("SELECT COUNT(*) FROM households")?,
            pending_documents: count(
                "SELECT COUNT(*) FROM document_requests WHERE status = 'pending'",
            )?,
            released_documents: count(
                "SELECT COUNT(*) FROM document_requests WHERE status = 'released'",
            )?,
            open_complaints: count(
                "SELECT COUNT(*) FROM complaints WHERE status IN ('filed', 'under_mediation')",
            )?,
            published_announcements: count(
                "SELECT COUNT(*) FROM announcements WHERE status = 'published'",
            )?,
            db_size_bytes,
        })
    }
}

/// Record counts shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordStats {
    /// Active residents.
    pub residents: i64,
    /// Active male residents.
    pub male: i64,
    /// Active female residents.
    pub female: i64,
    /// Active registered voters.
    pub voters: i64,
    /// Active residents aged 60 or over.
    pub seniors: i64,
    /// Active persons with disability.
    pub pwd: i64,
    /// Households.
    pub households: i64,
    /// Document requests awaiting review.
    pub pending_documents: i64,
    /// Documents released.
    pub released_documents: i64,
    /// Complaints filed or under mediation.
    pub open_complaints: i64,
    /// Announcements currently published.
    pub published_announcements: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Format a timestamp the way it is stored.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Format a date the way it is stored.
pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Clamp a requested page to `(limit, offset)` SQL parameters.
pub(crate) fn page_bounds(limit: Option<usize>, offset: Option<usize>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0);
    (
        i64::try_from(limit).unwrap_or(i64::MAX),
        i64::try_from(offset).unwrap_or(i64::MAX),
    )
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

/// Read a stored timestamp column.
pub(crate) fn column_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("invalid timestamp {raw:?}: {e}")))
}

/// Read a nullable timestamp column.
pub(crate) fn column_opt_timestamp(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, format!("invalid timestamp {raw:?}: {e}")))
    })
    .transpose()
}

/// Read a stored date column.
pub(crate) fn column_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| conversion_error(idx, format!("invalid date {raw:?}: {e}")))
}

/// Read a nullable date column.
pub(crate) fn column_opt_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|e| conversion_error(idx, format!("invalid date {raw:?}: {e}")))
    })
    .transpose()
}

/// Read a text column holding an enum's stored representation.
pub(crate) fn column_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = Error>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: Error| conversion_error(idx, e.to_string()))
}
