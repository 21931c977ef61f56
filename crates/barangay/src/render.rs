//! Printable output: certificates and the issued-documents register.

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};

use crate::config::BarangayConfig;
use crate::error::{Error, Result};
use crate::models::{DocumentRequest, DocumentStatus, DocumentType, Resident};

/// Page width for certificates, in characters.
const PAGE_WIDTH: usize = 72;

/// Columns of the issued-documents CSV.
pub const CSV_HEADER: [&str; 10] = [
    "control_number",
    "document_type",
    "resident_code",
    "resident_name",
    "purpose",
    "fee",
    "processed_by",
    "released_at",
    "valid_until",
    "remarks",
];

/// Render a released document as a plain-text certificate.
///
/// # Errors
///
/// Returns a validation error unless the document has been released.
pub fn render_certificate(
    barangay: &BarangayConfig,
    document: &DocumentRequest,
    resident: &Resident,
) -> Result<String> {
    let (Some(released_at), DocumentStatus::Released) = (document.released_at, document.status)
    else {
        return Err(Error::validation(format!(
            "document {} is {} and cannot be printed until released",
            document.control_number, document.status
        )));
    };
    let issued_on = calendar_day(released_at, &Local);

    let mut out = String::new();
    for line in [
        "Republic of the Philippines".to_string(),
        format!("Province of {}", barangay.province),
        format!("Municipality of {}", barangay.municipality),
        format!("BARANGAY {}", barangay.name.to_uppercase()),
        String::new(),
        "OFFICE OF THE PUNONG BARANGAY".to_string(),
    ] {
        out.push_str(&center(&line));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&center(document.document_type.title()));
    out.push_str("\n\n");
    out.push_str(&format!("Control No.: {}\n\n", document.control_number));
    out.push_str("TO WHOM IT MAY CONCERN:\n\n");

    let address = format!(
        "{}, {}, Barangay {}, {}, {}",
        resident.address, resident.purok, barangay.name, barangay.municipality, barangay.province
    );
    let subject = format!(
        "{}, {} years old, {}",
        resident.full_name().to_uppercase(),
        resident.age_on(issued_on),
        resident.civil_status
    );
    let certification = match document.document_type {
        DocumentType::BarangayClearance => format!(
            "This is to certify that {subject}, with residence at {address}, \
             has no derogatory record on file in this barangay."
        ),
        DocumentType::CertificateOfResidency => format!(
            "This is to certify that {subject}, is a bona fide resident of {address}."
        ),
        DocumentType::CertificateOfIndigency => format!(
            "This is to certify that {subject}, of {address}, belongs to an indigent \
             family in this barangay."
        ),
        DocumentType::BusinessClearance => format!(
            "This is to certify that {subject}, of {address}, is granted clearance to \
             operate a business within the territorial jurisdiction of this barangay."
        ),
    };
    push_paragraph(&mut out, &certification);
    push_paragraph(
        &mut out,
        &format!(
            "This certification is issued upon the request of the above-named person \
             for the purpose of: {}.",
            document.purpose
        ),
    );
    push_paragraph(
        &mut out,
        &format!(
            "Issued this {} day of {}.",
            ordinal(issued_on.day()),
            issued_on.format("%B %Y")
        ),
    );

    if let Some(valid_until) = document.valid_until {
        out.push_str(&format!("Valid until: {}\n", long_date(valid_until)));
    }
    out.push_str(&format!("Fee paid: PHP {}\n", pesos(document.fee_centavos)));
    out.push_str("\n\n");

    let indent = " ".repeat(PAGE_WIDTH / 2);
    out.push_str(&format!("{indent}________________________\n"));
    out.push_str(&format!("{indent}HON. {}\n", barangay.captain.to_uppercase()));
    out.push_str(&format!("{indent}Punong Barangay\n"));
    Ok(out)
}

/// Render released documents as CSV (RFC 4180: CRLF line endings, fields
/// quoted when they contain a comma, quote or line break).
#[must_use]
pub fn export_csv(rows: &[(DocumentRequest, Resident)]) -> String {
    let mut out = String::new();
    push_record(&mut out, CSV_HEADER.iter().map(|h| (*h).to_string()));

    for (document, resident) in rows {
        push_record(
            &mut out,
            [
                document.control_number.clone(),
                document.document_type.as_str().to_string(),
                resident.resident_code.clone(),
                resident.full_name(),
                document.purpose.clone(),
                pesos(document.fee_centavos),
                document.processed_by.clone().unwrap_or_default(),
                document
                    .released_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default(),
                document
                    .valid_until
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                document.remarks.clone().unwrap_or_default(),
            ],
        );
    }
    out
}

fn push_record(out: &mut String, fields: impl IntoIterator<Item = String>) {
    let line = fields
        .into_iter()
        .map(|field| csv_field(&field))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push_str("\r\n");
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Format centavos as pesos with two decimals.
fn pesos(centavos: i64) -> String {
    let sign = if centavos < 0 { "-" } else { "" };
    let abs = centavos.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= PAGE_WIDTH {
        return text.to_string();
    }
    format!("{}{text}", " ".repeat((PAGE_WIDTH - len) / 2))
}

/// Calendar day of `at` as seen in `zone`.
fn calendar_day<Tz: TimeZone>(at: DateTime<Utc>, zone: &Tz) -> NaiveDate {
    at.with_timezone(zone).date_naive()
}

/// Append `text` word-wrapped to the page width, followed by a blank line.
fn push_paragraph(out: &mut String, text: &str) {
    let mut width = 0;
    for word in text.split_whitespace() {
        let len = word.chars().count();
        if width > 0 && width + 1 + len > PAGE_WIDTH {
            out.push('\n');
            width = 0;
        }
        if width > 0 {
            out.push(' ');
            width += 1;
        }
        out.push_str(word);
        width += len;
    }
    out.push_str("\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CivilStatus, ResidentStatus, Sex};
    use chrono::FixedOffset;

    fn released_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn barangay() -> BarangayConfig {
        BarangayConfig {
            name: "San Isidro".to_string(),
            municipality: "Tanay".to_string(),
            province: "Rizal".to_string(),
            captain: "Rosa Dizon".to_string(),
        }
    }

    fn resident() -> Resident {
        Resident {
            id: 1,
            resident_code: "RES-2026-0001".to_string(),
            first_name: "Maria".to_string(),
            middle_name: Some("Lopez".to_string()),
            last_name: "Santos".to_string(),
            suffix: None,
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            sex: Sex::Female,
            civil_status: CivilStatus::Single,
            purok: "Purok 1".to_string(),
            address: "1 Luna St.".to_string(),
            contact_number: None,
            email: None,
            occupation: None,
            is_voter: true,
            is_pwd: false,
            household_code: None,
            status: ResidentStatus::Active,
            identity_key: String::new(),
            created_at: released_at(),
            updated_at: released_at(),
        }
    }

    fn document(status: DocumentStatus) -> DocumentRequest {
        let released = status == DocumentStatus::Released;
        DocumentRequest {
            id: 1,
            control_number: "BC-2026-00001".to_string(),
            resident_code: "RES-2026-0001".to_string(),
            document_type: DocumentType::BarangayClearance,
            purpose: "Employment, local".to_string(),
            status,
            fee_centavos: 10_000,
            remarks: None,
            processed_by: Some("clerk".to_string()),
            requested_at: released_at(),
            processed_at: Some(released_at()),
            released_at: released.then(released_at),
            valid_until: released.then(|| NaiveDate::from_ymd_opt(2027, 4, 17).unwrap()),
        }
    }

    #[test]
    fn test_certificate_contents() {
        let text =
            render_certificate(&barangay(), &document(DocumentStatus::Released), &resident())
                .unwrap();

        assert!(text.contains("BARANGAY SAN ISIDRO"));
        assert!(text.contains("BARANGAY CLEARANCE"));
        assert!(text.contains("Control No.: BC-2026-00001"));
        assert!(text.contains("MARIA L. SANTOS, 36 years old, single"));
        assert!(text.contains("Employment, local"));
        assert!(text.contains("Issued this 19th day of October 2026."));
        assert!(text.contains("Valid until: April 17, 2027"));
        assert!(text.contains("Fee paid: PHP 100.00"));
        assert!(text.contains("HON. ROSA DIZON"));
        assert!(text.lines().all(|line| line.chars().count() <= PAGE_WIDTH));
    }

    #[test]
    fn test_issue_day_follows_local_calendar() {
        let manila = FixedOffset::east_opt(8 * 3600).unwrap();
        let before_eight = manila
            .with_ymd_and_hms(2026, 10, 19, 7, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(before_eight.date_naive(), NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(
            calendar_day(before_eight, &manila),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
        );
    }

    #[test]
    fn test_certificate_requires_release() {
        let err = render_certificate(&barangay(), &document(DocumentStatus::Approved), &resident())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_export_csv_quotes_fields() {
        let csv = export_csv(&[(document(DocumentStatus::Released), resident())]);
        let lines: Vec<_> = csv.split("\r\n").collect();

        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert!(lines[1].starts_with("BC-2026-00001,barangay_clearance,RES-2026-0001,"));
        assert!(lines[1].contains("\"Employment, local\""));
        assert!(lines[1].contains(",100.00,"));
        assert!(csv.ends_with("\r\n"));
    }

    #[test]
    fn test_csv_field_escaping() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(pesos(5), "0.05");
        assert_eq!(pesos(123_456), "1234.56");
        assert_eq!(pesos(-250), "-2.50");
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(22), "22nd");
        assert_eq!(ordinal(23), "23rd");
    }
}
