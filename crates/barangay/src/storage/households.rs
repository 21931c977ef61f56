//! Households and their membership.

use chrono::Utc;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{Household, HouseholdDetail, HouseholdFilter, HouseholdUpdate, NewHousehold};

use super::query::Conditions;
use super::residents::{row_to_resident, SELECT_RESIDENT};
use super::{column_timestamp, format_timestamp, page_bounds, Sequence, Storage};

const SELECT_HOUSEHOLD: &str = r"
    SELECT h.id, h.household_code, h.purok, h.address, head.resident_code,
           (SELECT COUNT(*) FROM residents m WHERE m.household_id = h.id),
           h.created_at, h.updated_at
    FROM households h
    LEFT JOIN residents head ON head.id = h.head_resident_id
";

impl Storage {
    /// Create a household with no members.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields or a database error.
    pub fn create_household(&self, input: &NewHousehold) -> Result<Household> {
        let household = input.normalized()?;

        let tx = self.conn.unchecked_transaction()?;
        let code = Sequence::Household.next(&tx)?;
        tx.execute(
            r"
            INSERT INTO households (household_code, purok, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ",
            params![
                code,
                household.purok,
                household.address,
                format_timestamp(Utc::now())
            ],
        )?;
        tx.commit()?;

        info!("Created household {}", code);
        self.household(&code)
    }

    /// Get a household and its members.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn get_household(&self, code: &str) -> Result<HouseholdDetail> {
        let household = self.household(code)?;

        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_RESIDENT} WHERE r.household_id = ?1 ORDER BY r.birth_date, r.resident_code"
        ))?;
        let members = stmt
            .query_map([household.id], row_to_resident)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(HouseholdDetail { household, members })
    }

    /// List households ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_households(&self, filter: &HouseholdFilter) -> Result<Vec<Household>> {
        let mut conditions = Conditions::new();
        conditions.push_search(&["h.household_code", "h.address"], filter.search.as_deref());
        if let Some(purok) = &filter.purok {
            conditions.push("h.purok = ?", purok.clone());
        }

        let sql = format!(
            "{SELECT_HOUSEHOLD}{} \
             ORDER BY LENGTH(h.household_code), h.household_code LIMIT ? OFFSET ?",
            conditions.where_sql()
        );
        let values = conditions.into_values_with_page(page_bounds(filter.limit, filter.offset));

        let mut stmt = self.conn.prepare(&sql)?;
        let households = stmt
            .query_map(params_from_iter(values.iter()), row_to_household)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(households)
    }

    /// Change a household's purok or address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], a validation error, or a database error.
    pub fn update_household(&self, code: &str, update: HouseholdUpdate) -> Result<Household> {
        let current = self.household(code)?;
        let merged = update.apply_to(&current).normalized()?;

        self.conn.execute(
            "UPDATE households SET purok = ?2, address = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                current.id,
                merged.purok,
                merged.address,
                format_timestamp(Utc::now())
            ],
        )?;

        debug!("Updated household {}", code);
        self.household(code)
    }

    /// Assign a resident to a household.
    ///
    /// A resident belongs to at most one household; adding them here moves
    /// them out of any previous one, which loses its head if they were it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown household or resident, or a
    /// database error.
    pub fn add_household_member(&self, code: &str, resident_code: &str) -> Result<HouseholdDetail> {
        let household = self.household(code)?;
        let resident_id = self.resident_id(resident_code)?;
        let now = format_timestamp(Utc::now());

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r"
            UPDATE households SET head_resident_id = NULL, updated_at = ?3
            WHERE head_resident_id = ?1 AND id != ?2
            ",
            params![resident_id, household.id, now],
        )?;
        tx.execute(
            "UPDATE residents SET household_id = ?2, updated_at = ?3 WHERE id = ?1",
            params![resident_id, household.id, now],
        )?;
        touch(&tx, household.id, &now)?;
        tx.commit()?;

        info!("Added {} to household {}", resident_code, code);
        self.get_household(code)
    }

    /// Remove a resident from a household, clearing the head if it was them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the household does not exist or the
    /// resident is not one of its members.
    pub fn remove_household_member(
        &self,
        code: &str,
        resident_code: &str,
    ) -> Result<HouseholdDetail> {
        let household = self.household(code)?;
        let resident_id = self.member_id(household.id, code, resident_code)?;
        let now = format_timestamp(Utc::now());

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE residents SET household_id = NULL, updated_at = ?2 WHERE id = ?1",
            params![resident_id, now],
        )?;
        tx.execute(
            r"
            UPDATE households SET head_resident_id = NULL
            WHERE id = ?1 AND head_resident_id = ?2
            ",
            params![household.id, resident_id],
        )?;
        touch(&tx, household.id, &now)?;
        tx.commit()?;

        info!("Removed {} from household {}", resident_code, code);
        self.get_household(code)
    }

    /// Make a member the head of their household.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the household does not exist or the
    /// resident is not one of its members.
    pub fn set_household_head(&self, code: &str, resident_code: &str) -> Result<HouseholdDetail> {
        let household = self.household(code)?;
        let resident_id = self.member_id(household.id, code, resident_code)?;

        self.conn.execute(
            "UPDATE households SET head_resident_id = ?2, updated_at = ?3 WHERE id = ?1",
            params![household.id, resident_id, format_timestamp(Utc::now())],
        )?;

        info!("{} is now head of household {}", resident_code, code);
        self.get_household(code)
    }

    /// Delete a household. Its members stay registered without a household.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn delete_household(&self, code: &str) -> Result<()> {
        let household = self.household(code)?;

        let tx = self.conn.unchecked_transaction()?;
        let unassigned = tx.execute(
            "UPDATE residents SET household_id = NULL, updated_at = ?2 WHERE household_id = ?1",
            params![household.id, format_timestamp(Utc::now())],
        )?;
        tx.execute("DELETE FROM households WHERE id = ?1", [household.id])?;
        tx.commit()?;

        info!("Deleted household {} ({} members unassigned)", code, unassigned);
        Ok(())
    }

    fn household(&self, code: &str) -> Result<Household> {
        self.conn
            .query_row(
                &format!("{SELECT_HOUSEHOLD} WHERE h.household_code = ?1"),
                [code],
                row_to_household,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("household", code))
    }

    /// Row id of `resident_code`, provided they belong to the household.
    fn member_id(&self, household_id: i64, code: &str, resident_code: &str) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT id FROM residents WHERE resident_code = ?1 AND household_id = ?2",
                params![resident_code, household_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| {
                Error::not_found("household member", format!("{resident_code} in {code}"))
            })
    }
}

fn touch(conn: &rusqlite::Connection, household_id: i64, now: &str) -> Result<()> {
    conn.execute(
        "UPDATE households SET updated_at = ?2 WHERE id = ?1",
        params![household_id, now],
    )?;
    Ok(())
}

fn row_to_household(row: &Row<'_>) -> rusqlite::Result<Household> {
    Ok(Household {
        id: row.get(0)?,
        household_code: row.get(1)?,
        purok: row.get(2)?,
        address: row.get(3)?,
        head_resident_code: row.get(4)?,
        member_count: row.get(5)?,
        created_at: column_timestamp(row, 6)?,
        updated_at: column_timestamp(row, 7)?,
    })
}
