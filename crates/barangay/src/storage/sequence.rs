//! Sequential public codes.
//!
//! Codes are a prefix followed by a zero-padded counter, e.g.
//! `RES-2026-0042`. The next counter is one more than the highest existing
//! code with the same prefix. Callers must read the next code and insert the
//! row inside one transaction; the `UNIQUE` constraints on code columns catch
//! anything that slips through.

use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::models::DocumentType;

/// Kinds of sequential code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    /// `RES-<year>-<NNNN>`, restarting each year.
    Resident {
        /// Registration year.
        year: i32,
    },
    /// `HH-<NNNN>`, never restarting.
    Household,
    /// `<PREFIX>-<year>-<NNNNN>`, per document type and year.
    Document {
        /// Kind of document.
        document_type: DocumentType,
        /// Request year.
        year: i32,
    },
    /// `CMP-<year>-<NNNN>`, restarting each year.
    Complaint {
        /// Filing year.
        year: i32,
    },
}

impl Sequence {
    /// Resident codes for the year of `date`.
    #[must_use]
    pub fn resident(date: NaiveDate) -> Self {
        Self::Resident { year: date.year() }
    }

    /// Control numbers for a document type in the year of `date`.
    #[must_use]
    pub fn document(document_type: DocumentType, date: NaiveDate) -> Self {
        Self::Document {
            document_type,
            year: date.year(),
        }
    }

    /// Complaint case numbers for the year of `date`.
    #[must_use]
    pub fn complaint(date: NaiveDate) -> Self {
        Self::Complaint { year: date.year() }
    }

    /// The `(table, column)` holding codes of this kind.
    fn location(self) -> (&'static str, &'static str) {
        match self {
            Self::Resident { .. } => ("residents", "resident_code"),
            Self::Household => ("households", "household_code"),
            Self::Document { .. } => ("document_requests", "control_number"),
            Self::Complaint { .. } => ("complaints", "case_number"),
        }
    }

    /// Prefix shared by all codes of this kind, including the trailing `-`.
    #[must_use]
    pub fn prefix(self) -> String {
        match self {
            Self::Resident { year } => format!("RES-{year}-"),
            Self::Household => "HH-".to_string(),
            Self::Document {
                document_type,
                year,
            } => format!("{}-{year}-", document_type.prefix()),
            Self::Complaint { year } => format!("CMP-{year}-"),
        }
    }

    fn width(self) -> usize {
        match self {
            Self::Document { .. } => 5,
            _ => 4,
        }
    }

    /// Format the code for a counter value.
    #[must_use]
    pub fn format(self, counter: u32) -> String {
        format!("{}{counter:0width$}", self.prefix(), width = self.width())
    }

    /// Compute the next code.
    ///
    /// Orders by length first so `RES-2026-10000` sorts after
    /// `RES-2026-9999` once the counter outgrows its padding.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or an existing code has a
    /// non-numeric suffix.
    pub fn next(self, conn: &Connection) -> Result<String> {
        let (table, column) = self.location();
        let prefix = self.prefix();
        let sql = format!(
            "SELECT {column} FROM {table} WHERE {column} LIKE ?1 \
             ORDER BY LENGTH({column}) DESC, {column} DESC LIMIT 1"
        );

        let highest: Option<String> = conn
            .query_row(&sql, [format!("{prefix}%")], |row| row.get(0))
            .optional()?;

        let next = match highest {
            Some(code) => {
                let suffix = &code[prefix.len()..];
                let current: u32 = suffix.parse().map_err(|_| {
                    Error::internal(format!("malformed code in {table}.{column}: {code}"))
                })?;
                current + 1
            }
            None => 1,
        };

        Ok(self.format(next))
    }
}
