//! Document requests and their processing.
//!
//! A request moves `pending -> approved -> released`, or
//! `pending -> rejected`. Status changes are applied with a compare-and-set
//! on the current status so a stale read can never skip a step.

use chrono::{Days, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{
    DocumentFilter, DocumentRequest, DocumentStatus, NewDocumentRequest, Resident, ResidentStatus,
};
use crate::validation::required;

use super::query::Conditions;
use super::{
    column_enum, column_opt_date, column_opt_timestamp, column_timestamp, format_date,
    format_timestamp, page_bounds, Sequence, Storage,
};

const SELECT_DOCUMENT: &str = r"
    SELECT d.id, d.control_number, r.resident_code, d.document_type, d.purpose, d.status,
           d.fee_centavos, d.remarks, d.processed_by, d.requested_at, d.processed_at,
           d.released_at, d.valid_until
    FROM document_requests d
    JOIN residents r ON r.id = d.resident_id
";

impl Storage {
    /// File a document request for an active resident.
    ///
    /// `fee_centavos` is the configured fee for the document type; it is
    /// recorded on the request so later fee changes don't alter it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown resident, a validation
    /// error for blank fields or a resident who is no longer active, or a
    /// database error.
    pub fn request_document(
        &self,
        input: &NewDocumentRequest,
        fee_centavos: i64,
        today: NaiveDate,
    ) -> Result<DocumentRequest> {
        let request = input.normalized()?;
        let resident = self.get_resident(&request.resident_code)?;
        if resident.status != ResidentStatus::Active {
            return Err(Error::validation(format!(
                "resident {} is {} and cannot request documents",
                resident.resident_code, resident.status
            )));
        }

        let tx = self.conn.unchecked_transaction()?;
        let number = Sequence::document(request.document_type, today).next(&tx)?;
        tx.execute(
            r"
            INSERT INTO document_requests (
                control_number, resident_id, document_type, purpose, status,
                fee_centavos, requested_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                number,
                resident.id,
                request.document_type.as_str(),
                request.purpose,
                DocumentStatus::Pending.as_str(),
                fee_centavos,
                format_timestamp(Utc::now()),
            ],
        )?;
        tx.commit()?;

        info!(
            "Document {} requested by {}",
            number, resident.resident_code
        );
        self.get_document(&number)
    }

    /// Get a document request by control number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn get_document(&self, number: &str) -> Result<DocumentRequest> {
        self.conn
            .query_row(
                &format!("{SELECT_DOCUMENT} WHERE d.control_number = ?1"),
                [number],
                row_to_document,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("document", number))
    }

    /// List document requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRequest>> {
        let mut conditions = Conditions::new();
        if let Some(status) = filter.status {
            conditions.push("d.status = ?", status.as_str());
        }
        if let Some(document_type) = filter.document_type {
            conditions.push("d.document_type = ?", document_type.as_str());
        }
        if let Some(resident) = &filter.resident_code {
            conditions.push("r.resident_code = ?", resident.clone());
        }

        let sql = format!(
            "{SELECT_DOCUMENT}{} ORDER BY d.requested_at DESC, d.id DESC LIMIT ? OFFSET ?",
            conditions.where_sql()
        );
        let values = conditions.into_values_with_page(page_bounds(filter.limit, filter.offset));

        let mut stmt = self.conn.prepare(&sql)?;
        let documents = stmt
            .query_map(params_from_iter(values.iter()), row_to_document)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(documents)
    }

    /// Approve a pending request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], [`Error::InvalidTransition`] unless the
    /// request is pending, or a database error.
    pub fn approve_document(&self, number: &str, processed_by: &str) -> Result<DocumentRequest> {
        let current = self.get_document(number)?;
        current.status.ensure_transition(DocumentStatus::Approved)?;

        let now = format_timestamp(Utc::now());
        self.set_document_status(
            &current,
            DocumentStatus::Approved,
            r"
            UPDATE document_requests
            SET status = ?3, processed_by = ?4, processed_at = ?5
            WHERE id = ?1 AND status = ?2
            ",
            params![
                current.id,
                current.status.as_str(),
                DocumentStatus::Approved.as_str(),
                processed_by,
                now
            ],
        )
    }

    /// Reject a pending request. A reason is required.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], a validation error for blank remarks,
    /// [`Error::InvalidTransition`] unless the request is pending, or a
    /// database error.
    pub fn reject_document(
        &self,
        number: &str,
        processed_by: &str,
        remarks: &str,
    ) -> Result<DocumentRequest> {
        let remarks = required("remarks", remarks)?;
        let current = self.get_document(number)?;
        current.status.ensure_transition(DocumentStatus::Rejected)?;

        let now = format_timestamp(Utc::now());
        self.set_document_status(
            &current,
            DocumentStatus::Rejected,
            r"
            UPDATE document_requests
            SET status = ?3, processed_by = ?4, processed_at = ?5, remarks = ?6
            WHERE id = ?1 AND status = ?2
            ",
            params![
                current.id,
                current.status.as_str(),
                DocumentStatus::Rejected.as_str(),
                processed_by,
                now,
                remarks
            ],
        )
    }

    /// Release an approved document.
    ///
    /// The document is valid for `validity_days` from `today`, the local
    /// calendar day of the release.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], [`Error::InvalidTransition`] unless the
    /// request is approved, or a database error.
    pub fn release_document(
        &self,
        number: &str,
        released_by: &str,
        validity_days: u32,
        today: NaiveDate,
    ) -> Result<DocumentRequest> {
        let current = self.get_document(number)?;
        current.status.ensure_transition(DocumentStatus::Released)?;

        let released_at = Utc::now();
        let valid_until = valid_until(today, validity_days);
        self.set_document_status(
            &current,
            DocumentStatus::Released,
            r"
            UPDATE document_requests
            SET status = ?3, processed_by = ?4, released_at = ?5, valid_until = ?6
            WHERE id = ?1 AND status = ?2
            ",
            params![
                current.id,
                current.status.as_str(),
                DocumentStatus::Released.as_str(),
                released_by,
                format_timestamp(released_at),
                format_date(valid_until)
            ],
        )
    }

    /// Every released document with its resident, in release order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn released_documents(&self) -> Result<Vec<(DocumentRequest, Resident)>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_DOCUMENT} WHERE d.status = ?1 ORDER BY d.released_at, d.id"
        ))?;
        let documents = stmt
            .query_map([DocumentStatus::Released.as_str()], row_to_document)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        documents
            .into_iter()
            .map(|document| {
                let resident = self.get_resident(&document.resident_code)?;
                Ok((document, resident))
            })
            .collect()
    }

    fn set_document_status(
        &self,
        current: &DocumentRequest,
        next: DocumentStatus,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<DocumentRequest> {
        let changed = self.conn.execute(sql, params)?;
        if changed == 0 {
            // Another writer moved it first; report against what is stored now.
            let stored = self.get_document(&current.control_number)?;
            return Err(Error::invalid_transition("document", stored.status, next));
        }

        debug!(
            "Document {} moved from {} to {}",
            current.control_number, current.status, next
        );
        self.get_document(&current.control_number)
    }
}

/// Last day a document released on `released_on` is valid.
fn valid_until(released_on: NaiveDate, validity_days: u32) -> NaiveDate {
    released_on
        .checked_add_days(Days::new(u64::from(validity_days)))
        .unwrap_or(released_on)
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<DocumentRequest> {
    Ok(DocumentRequest {
        id: row.get(0)?,
        control_number: row.get(1)?,
        resident_code: row.get(2)?,
        document_type: column_enum(row, 3)?,
        purpose: row.get(4)?,
        status: column_enum(row, 5)?,
        fee_centavos: row.get(6)?,
        remarks: row.get(7)?,
        processed_by: row.get(8)?,
        requested_at: column_timestamp(row, 9)?,
        processed_at: column_opt_timestamp(row, 10)?,
        released_at: column_opt_timestamp(row, 11)?,
        valid_until: column_opt_date(row, 12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{register, storage, today};
    use super::*;
    use crate::models::DocumentType;

    fn request(
        storage: &Storage,
        resident_code: &str,
        document_type: DocumentType,
    ) -> DocumentRequest {
        let input = NewDocumentRequest {
            resident_code: resident_code.to_string(),
            document_type,
            purpose: "Employment".to_string(),
        };
        storage.request_document(&input, 10_000, today()).unwrap()
    }

    #[test]
    fn test_request_document() {
        let storage = storage();
        let maria = register(&storage, "Maria", "Santos");

        let document = request(&storage, &maria.resident_code, DocumentType::BarangayClearance);
        assert_eq!(document.control_number, "BC-2026-00001");
        assert_eq!(document.status, DocumentStatus::Pending);
        assert_eq!(document.fee_centavos, 10_000);
        assert_eq!(document.resident_code, maria.resident_code);
        assert!(document.processed_at.is_none());
    }

    #[test]
    fn test_control_numbers_are_per_type() {
        let storage = storage();
        let maria = register(&storage, "Maria", "Santos");
        let code = &maria.resident_code;

        request(&storage, code, DocumentType::BarangayClearance);
        let second = request(&storage, code, DocumentType::BarangayClearance);
        let other = request(&storage, code, DocumentType::CertificateOfIndigency);

        assert_eq!(second.control_number, "BC-2026-00002");
        assert_eq!(other.control_number, "COI-2026-00001");
    }

    #[test]
    fn test_request_requires_active_resident() {
        let storage = storage();
        let maria = register(&storage, "Maria", "Santos");
        storage
            .set_resident_status(&maria.resident_code, ResidentStatus::Moved)
            .unwrap();

        let input = NewDocumentRequest {
            resident_code: maria.resident_code.clone(),
            document_type: DocumentType::CertificateOfResidency,
            purpose: "School".to_string(),
        };
        let err = storage.request_document(&input, 0, today()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_request_unknown_resident() {
        let input = NewDocumentRequest {
            resident_code: "RES-2026-0404".to_string(),
            document_type: DocumentType::CertificateOfResidency,
            purpose: "School".to_string(),
        };
        assert!(storage()
            .request_document(&input, 0, today())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_approve_then_release() {
        let storage = storage();
        let maria = register(&storage, "Maria", "Santos");
        let document = request(&storage, &maria.resident_code, DocumentType::BarangayClearance);

        let approved = storage
            .approve_document(&document.control_number, "clerk")
            .unwrap();
        assert_eq!(approved.status, DocumentStatus::Approved);
        assert_eq!(approved.processed_by.as_deref(), Some("clerk"));
        assert!(approved.processed_at.is_some());

        let released = storage
            .release_document(&document.control_number, "clerk", 180, today())
            .unwrap();
        assert_eq!(released.status, DocumentStatus::Released);
        assert!(released.released_at.is_some());
        assert_eq!(
            released.valid_until,
            Some(NaiveDate::from_ymd_opt(2027, 4, 17).unwrap())
        );
    }

    #[test]
    fn test_validity_counts_from_local_release_day() {
        // 07:30 on 19 October in Manila is still 18 October in UTC
        let released_on = chrono::DateTime::parse_from_rfc3339("2026-10-19T07:30:00+08:00")
            .unwrap()
            .date_naive();
        assert_eq!(
            valid_until(released_on, 180),
            NaiveDate::from_ymd_opt(2027, 4, 17).unwrap()
        );
    }

    #[test]
    fn test_release_requires_approval() {
        let storage = storage();
        let maria = register(&storage, "Maria", "Santos");
        let document = request(&storage, &maria.resident_code, DocumentType::BarangayClearance);

        let err = storage
            .release_document(&document.control_number, "clerk", 180, today())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[test]
    fn test_reject_requires_remarks() {
        let storage = storage();
        let maria = register(&storage, "Maria", "Santos");
        let document = request(&storage, &maria.resident_code, DocumentType::BarangayClearance);

        let err = storage
            .reject_document(&document.control_number, "clerk", "  ")
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let rejected = storage
            .reject_document(&document.control_number, "clerk", "Incomplete requirements")
            .unwrap();
        assert_eq!(rejected.status, DocumentStatus::Rejected);
        assert_eq!(rejected.remarks.as_deref(), Some("Incomplete requirements"));

        let err = storage
            .approve_document(&document.control_number, "clerk")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[test]
    fn test_list_documents_filters() {
        let storage = storage();
        let maria = register(&storage, "Maria", "Santos");
        let liza = register(&storage, "Liza", "Reyes");
        let first = request(&storage, &maria.resident_code, DocumentType::BarangayClearance);
        request(&storage, &liza.resident_code, DocumentType::BusinessClearance);
        storage
            .approve_document(&first.control_number, "clerk")
            .unwrap();

        let pending = DocumentFilter {
            status: Some(DocumentStatus::Pending),
            ..DocumentFilter::default()
        };
        let found = storage.list_documents(&pending).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].resident_code, liza.resident_code);

        let by_resident = DocumentFilter {
            resident_code: Some(maria.resident_code.clone()),
            ..DocumentFilter::default()
        };
        assert_eq!(storage.list_documents(&by_resident).unwrap().len(), 1);
        assert_eq!(storage.list_documents(&DocumentFilter::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_released_documents() {
        let storage = storage();
        let maria = register(&storage, "Maria", "Santos");
        let document = request(&storage, &maria.resident_code, DocumentType::BarangayClearance);
        request(&storage, &maria.resident_code, DocumentType::BarangayClearance);

        storage
            .approve_document(&document.control_number, "clerk")
            .unwrap();
        storage
            .release_document(&document.control_number, "clerk", 30, today())
            .unwrap();

        let released = storage.released_documents().unwrap();
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].0.control_number, document.control_number);
        assert_eq!(released[0].1.first_name, "Maria");
        assert_eq!(storage.stats(today()).unwrap().released_documents, 1);
    }

    #[test]
    fn test_deleting_resident_removes_requests() {
        let storage = storage();
        let maria = register(&storage, "Maria", "Santos");
        let document = request(&storage, &maria.resident_code, DocumentType::BarangayClearance);

        storage.delete_resident(&maria.resident_code).unwrap();
        assert!(storage
            .get_document(&document.control_number)
            .unwrap_err()
            .is_not_found());
    }
}
