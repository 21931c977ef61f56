//! Resident registration and lookup.

use chrono::{Months, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{
    NewResident, Resident, ResidentFilter, ResidentStatus, ResidentUpdate, SENIOR_AGE,
};

use super::query::Conditions;
use super::{
    column_date, column_enum, column_timestamp, format_date, format_timestamp, page_bounds,
    Sequence, Storage,
};

/// Resident columns in `row_to_resident` order, with the household code joined.
pub(crate) const SELECT_RESIDENT: &str = r"
    SELECT r.id, r.resident_code, r.first_name, r.middle_name, r.last_name, r.suffix,
           r.birth_date, r.sex, r.civil_status, r.purok, r.address, r.contact_number,
           r.email, r.occupation, r.is_voter, r.is_pwd, h.household_code, r.status,
           r.identity_key, r.created_at, r.updated_at
    FROM residents r
    LEFT JOIN households h ON h.id = r.household_id
";

/// Latest birth date that makes someone a senior on `today`.
pub(crate) fn senior_cutoff(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(SENIOR_AGE * 12))
        .unwrap_or(NaiveDate::MIN)
}

impl Storage {
    /// Register a new resident.
    ///
    /// The input is validated and normalized, then checked against existing
    /// identity keys. The resident code is assigned from the registration
    /// year of `today`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, [`Error::Duplicate`] if the
    /// same person is already registered, or a database error.
    pub fn register_resident(&self, input: &NewResident, today: NaiveDate) -> Result<Resident> {
        let resident = input.normalized(today)?;
        let identity_key = resident.identity_key();

        let tx = self.conn.unchecked_transaction()?;

        if let Some(existing) = self.code_for_identity(&identity_key, None)? {
            return Err(Error::duplicate(
                "resident",
                format!("already registered as {existing}"),
            ));
        }

        let code = Sequence::resident(today).next(&tx)?;
        let now = format_timestamp(Utc::now());

        tx.execute(
            r"
            INSERT INTO residents (
                resident_code, first_name, middle_name, last_name, suffix, birth_date,
                sex, civil_status, purok, address, contact_number, email, occupation,
                is_voter, is_pwd, status, identity_key, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?18)
            ",
            params![
                code,
                resident.first_name,
                resident.middle_name,
                resident.last_name,
                resident.suffix,
                format_date(resident.birth_date),
                resident.sex.as_str(),
                resident.civil_status.as_str(),
                resident.purok,
                resident.address,
                resident.contact_number,
                resident.email,
                resident.occupation,
                resident.is_voter,
                resident.is_pwd,
                ResidentStatus::Active.as_str(),
                identity_key,
                now,
            ],
        )?;
        tx.commit()?;

        info!("Registered resident {}", code);
        self.get_resident(&code)
    }

    /// Get a resident by code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no resident has this code.
    pub fn get_resident(&self, code: &str) -> Result<Resident> {
        self.conn
            .query_row(
                &format!("{SELECT_RESIDENT} WHERE r.resident_code = ?1"),
                [code],
                row_to_resident,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("resident", code))
    }

    /// List residents matching a filter, ordered by surname.
    ///
    /// `today` anchors the senior-citizen filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_residents(
        &self,
        filter: &ResidentFilter,
        today: NaiveDate,
    ) -> Result<Vec<Resident>> {
        let mut conditions = Conditions::new();
        conditions.push_search(
            &["r.first_name", "r.middle_name", "r.last_name", "r.resident_code"],
            filter.search.as_deref(),
        );
        if let Some(purok) = &filter.purok {
            conditions.push("r.purok = ?", purok.clone());
        }
        if let Some(sex) = filter.sex {
            conditions.push("r.sex = ?", sex.as_str());
        }
        if let Some(status) = filter.status {
            conditions.push("r.status = ?", status.as_str());
        }
        if let Some(is_voter) = filter.is_voter {
            conditions.push("r.is_voter = ?", is_voter);
        }
        if let Some(is_pwd) = filter.is_pwd {
            conditions.push("r.is_pwd = ?", is_pwd);
        }
        if let Some(household) = &filter.household_code {
            conditions.push("h.household_code = ?", household.clone());
        }
        if filter.seniors_only {
            conditions.push("r.birth_date <= ?", format_date(senior_cutoff(today)));
        }

        let sql = format!(
            "{SELECT_RESIDENT}{} ORDER BY r.last_name, r.first_name, r.resident_code LIMIT ? OFFSET ?",
            conditions.where_sql()
        );
        let values = conditions.into_values_with_page(page_bounds(filter.limit, filter.offset));

        let mut stmt = self.conn.prepare(&sql)?;
        let residents = stmt
            .query_map(params_from_iter(values.iter()), row_to_resident)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(residents)
    }

    /// Apply a partial update to a resident.
    ///
    /// The identity key is recomputed from the merged record; a collision
    /// with any other resident is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], a validation error,
    /// [`Error::Duplicate`], or a database error.
    pub fn update_resident(
        &self,
        code: &str,
        update: ResidentUpdate,
        today: NaiveDate,
    ) -> Result<Resident> {
        let current = self.get_resident(code)?;
        let merged = update.apply_to(&current).normalized(today)?;
        let identity_key = merged.identity_key();

        if let Some(existing) = self.code_for_identity(&identity_key, Some(current.id))? {
            return Err(Error::duplicate(
                "resident",
                format!("already registered as {existing}"),
            ));
        }

        self.conn.execute(
            r"
            UPDATE residents SET
                first_name = ?2, middle_name = ?3, last_name = ?4, suffix = ?5,
                birth_date = ?6, sex = ?7, civil_status = ?8, purok = ?9, address = ?10,
                contact_number = ?11, email = ?12, occupation = ?13, is_voter = ?14,
                is_pwd = ?15, identity_key = ?16, updated_at = ?17
            WHERE id = ?1
            ",
            params![
                current.id,
                merged.first_name,
                merged.middle_name,
                merged.last_name,
                merged.suffix,
                format_date(merged.birth_date),
                merged.sex.as_str(),
                merged.civil_status.as_str(),
                merged.purok,
                merged.address,
                merged.contact_number,
                merged.email,
                merged.occupation,
                merged.is_voter,
                merged.is_pwd,
                identity_key,
                format_timestamp(Utc::now()),
            ],
        )?;

        debug!("Updated resident {}", code);
        self.get_resident(code)
    }

    /// Change a resident's residency status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn set_resident_status(&self, code: &str, status: ResidentStatus) -> Result<Resident> {
        let changed = self.conn.execute(
            "UPDATE residents SET status = ?2, updated_at = ?3 WHERE resident_code = ?1",
            params![code, status.as_str(), format_timestamp(Utc::now())],
        )?;
        if changed == 0 {
            return Err(Error::not_found("resident", code));
        }

        info!("Resident {} is now {}", code, status);
        self.get_resident(code)
    }

    /// Permanently delete a resident.
    ///
    /// Households headed by the resident lose their head; the resident's
    /// document requests are deleted with them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn delete_resident(&self, code: &str) -> Result<()> {
        let id = self.resident_id(code)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE households SET head_resident_id = NULL WHERE head_resident_id = ?1",
            [id],
        )?;
        tx.execute("DELETE FROM residents WHERE id = ?1", [id])?;
        tx.commit()?;

        info!("Deleted resident {}", code);
        Ok(())
    }

    /// Row id for a resident code.
    pub(crate) fn resident_id(&self, code: &str) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT id FROM residents WHERE resident_code = ?1",
                [code],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::not_found("resident", code))
    }

    /// Code of the resident holding `identity_key`, other than `exclude_id`.
    fn code_for_identity(
        &self,
        identity_key: &str,
        exclude_id: Option<i64>,
    ) -> Result<Option<String>> {
        let code = self
            .conn
            .query_row(
                "SELECT resident_code FROM residents WHERE identity_key = ?1 AND id IS NOT ?2",
                params![identity_key, exclude_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(code)
    }
}

/// Convert a row selected with `SELECT_RESIDENT`.
pub(crate) fn row_to_resident(row: &Row<'_>) -> rusqlite::Result<Resident> {
    Ok(Resident {
        id: row.get(0)?,
        resident_code: row.get(1)?,
        first_name: row.get(2)?,
        middle_name: row.get(3)?,
        last_name: row.get(4)?,
        suffix: row.get(5)?,
        birth_date: column_date(row, 6)?,
        sex: column_enum(row, 7)?,
        civil_status: column_enum(row, 8)?,
        purok: row.get(9)?,
        address: row.get(10)?,
        contact_number: row.get(11)?,
        email: row.get(12)?,
        occupation: row.get(13)?,
        is_voter: row.get(14)?,
        is_pwd: row.get(15)?,
        household_code: row.get(16)?,
        status: column_enum(row, 17)?,
        identity_key: row.get(18)?,
        created_at: column_timestamp(row, 19)?,
        updated_at: column_timestamp(row, 20)?,
    })
}
