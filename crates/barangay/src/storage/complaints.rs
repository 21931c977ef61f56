//! Complaint (blotter) records.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Complaint, ComplaintFilter, ComplaintStatus, ComplaintTransition, NewComplaint};

use super::query::Conditions;
use super::{
    column_date, column_enum, column_timestamp, format_date, format_timestamp, page_bounds,
    Sequence, Storage,
};

const SELECT_COMPLAINT: &str = r"
    SELECT c.id, c.case_number, c.complainant_name, r.resident_code, c.respondent_name,
           c.category, c.description, c.incident_date, c.location, c.status, c.resolution,
           c.created_at, c.updated_at
    FROM complaints c
    LEFT JOIN residents r ON r.id = c.complainant_resident_id
";

impl Storage {
    /// File a complaint.
    ///
    /// When a complainant resident code is given it must name a registered
    /// resident.
    ///
    /// # Errors
    ///
    /// Returns a validation error, [`Error::NotFound`] for an unknown
    /// complainant code, or a database error.
    pub fn file_complaint(&self, input: &NewComplaint, today: NaiveDate) -> Result<Complaint> {
        let complaint = input.normalized(today)?;
        let complainant_id = complaint
            .complainant_resident_code
            .as_deref()
            .map(|code| self.resident_id(code))
            .transpose()?;

        let tx = self.conn.unchecked_transaction()?;
        let case_number = Sequence::complaint(today).next(&tx)?;
        tx.execute(
            r"
            INSERT INTO complaints (
                case_number, complainant_name, complainant_resident_id, respondent_name,
                category, description, incident_date, location, status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ",
            params![
                case_number,
                complaint.complainant_name,
                complainant_id,
                complaint.respondent_name,
                complaint.category.as_str(),
                complaint.description,
                format_date(complaint.incident_date),
                complaint.location,
                ComplaintStatus::Filed.as_str(),
                format_timestamp(Utc::now()),
            ],
        )?;
        tx.commit()?;

        info!("Filed complaint {}", case_number);
        self.get_complaint(&case_number)
    }

    /// Get a complaint by case number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn get_complaint(&self, case_number: &str) -> Result<Complaint> {
        self.conn
            .query_row(
                &format!("{SELECT_COMPLAINT} WHERE c.case_number = ?1"),
                [case_number],
                row_to_complaint,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("complaint", case_number))
    }

    /// List complaints, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>> {
        let mut conditions = Conditions::new();
        conditions.push_search(
            &["c.case_number", "c.complainant_name", "c.respondent_name"],
            filter.search.as_deref(),
        );
        if let Some(status) = filter.status {
            conditions.push("c.status = ?", status.as_str());
        }
        if let Some(category) = filter.category {
            conditions.push("c.category = ?", category.as_str());
        }

        let sql = format!(
            "{SELECT_COMPLAINT}{} ORDER BY c.created_at DESC, c.id DESC LIMIT ? OFFSET ?",
            conditions.where_sql()
        );
        let values = conditions.into_values_with_page(page_bounds(filter.limit, filter.offset));

        let mut stmt = self.conn.prepare(&sql)?;
        let complaints = stmt
            .query_map(params_from_iter(values.iter()), row_to_complaint)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(complaints)
    }

    /// Move a complaint to a new status.
    ///
    /// Resolution notes, when given, replace any earlier notes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], [`Error::InvalidTransition`], a
    /// validation error when resolving without notes, or a database error.
    pub fn transition_complaint(
        &self,
        case_number: &str,
        transition: &ComplaintTransition,
    ) -> Result<Complaint> {
        let current = self.get_complaint(case_number)?;
        let resolution = transition.check(current.status)?;

        let changed = self.conn.execute(
            r"
            UPDATE complaints
            SET status = ?3, resolution = COALESCE(?4, resolution), updated_at = ?5
            WHERE id = ?1 AND status = ?2
            ",
            params![
                current.id,
                current.status.as_str(),
                transition.status.as_str(),
                resolution,
                format_timestamp(Utc::now()),
            ],
        )?;
        if changed == 0 {
            let stored = self.get_complaint(case_number)?;
            return Err(Error::invalid_transition(
                "complaint",
                stored.status,
                transition.status,
            ));
        }

        info!(
            "Complaint {} moved from {} to {}",
            case_number, current.status, transition.status
        );
        self.get_complaint(case_number)
    }

    /// Delete a complaint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn delete_complaint(&self, case_number: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM complaints WHERE case_number = ?1", [case_number])?;
        if deleted == 0 {
            return Err(Error::not_found("complaint", case_number));
        }
        info!("Deleted complaint {}", case_number);
        Ok(())
    }
}

fn row_to_complaint(row: &Row<'_>) -> rusqlite::Result<Complaint> {
    Ok(Complaint {
        id: row.get(0)?,
        case_number: row.get(1)?,
        complainant_name: row.get(2)?,
        complainant_resident_code: row.get(3)?,
        respondent_name: row.get(4)?,
        category: column_enum(row, 5)?,
        description: row.get(6)?,
        incident_date: column_date(row, 7)?,
        location: row.get(8)?,
        status: column_enum(row, 9)?,
        resolution: row.get(10)?,
        created_at: column_timestamp(row, 11)?,
        updated_at: column_timestamp(row, 12)?,
    })
}
