//! `SQLite` schema definitions for barangay.
//!
//! Timestamps are stored as RFC 3339 text with fixed microsecond precision
//! and a `Z` suffix, and dates as `YYYY-MM-DD`, so both sort correctly as
//! text.

/// SQL statement to create the households table.
pub const CREATE_HOUSEHOLDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS households (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    household_code TEXT NOT NULL UNIQUE,
    purok TEXT NOT NULL,
    address TEXT NOT NULL,
    head_resident_id INTEGER REFERENCES residents(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the residents table.
pub const CREATE_RESIDENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS residents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    resident_code TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    middle_name TEXT,
    last_name TEXT NOT NULL,
    suffix TEXT,
    birth_date TEXT NOT NULL,
    sex TEXT NOT NULL,
    civil_status TEXT NOT NULL,
    purok TEXT NOT NULL,
    address TEXT NOT NULL,
    contact_number TEXT,
    email TEXT,
    occupation TEXT,
    is_voter INTEGER NOT NULL DEFAULT 0,
    is_pwd INTEGER NOT NULL DEFAULT 0,
    household_id INTEGER REFERENCES households(id) ON DELETE SET NULL,
    status TEXT NOT NULL,
    identity_key TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the document requests table.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS document_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    control_number TEXT NOT NULL UNIQUE,
    resident_id INTEGER NOT NULL REFERENCES residents(id) ON DELETE CASCADE,
    document_type TEXT NOT NULL,
    purpose TEXT NOT NULL,
    status TEXT NOT NULL,
    fee_centavos INTEGER NOT NULL,
    remarks TEXT,
    processed_by TEXT,
    requested_at TEXT NOT NULL,
    processed_at TEXT,
    released_at TEXT,
    valid_until TEXT
)
";

/// SQL statement to create the announcements table.
pub const CREATE_ANNOUNCEMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS announcements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    category TEXT NOT NULL,
    status TEXT NOT NULL,
    publish_at TEXT,
    archive_at TEXT,
    author TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the complaints table.
pub const CREATE_COMPLAINTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS complaints (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    case_number TEXT NOT NULL UNIQUE,
    complainant_name TEXT NOT NULL,
    complainant_resident_id INTEGER REFERENCES residents(id) ON DELETE SET NULL,
    respondent_name TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT NOT NULL,
    incident_date TEXT NOT NULL,
    location TEXT,
    status TEXT NOT NULL,
    resolution TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the accounts table.
pub const CREATE_ACCOUNTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    last_login_at TEXT
)
";

/// SQL statement to create the one-time codes table.
///
/// At most one outstanding code per account.
pub const CREATE_OTP_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS otp_codes (
    account_id INTEGER PRIMARY KEY REFERENCES accounts(id) ON DELETE CASCADE,
    code_hash TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    consumed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
)
";

/// Index for resident listing by purok.
pub const CREATE_RESIDENT_PUROK_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_residents_purok ON residents(purok)
";

/// Index for resident name search and ordering.
pub const CREATE_RESIDENT_NAME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_residents_name ON residents(last_name, first_name)
";

/// Index for household membership lookups.
pub const CREATE_RESIDENT_HOUSEHOLD_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_residents_household ON residents(household_id)
";

/// Index for document listing by status.
pub const CREATE_DOCUMENT_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_status ON document_requests(status)
";

/// Index for the announcement publish/archive sweep.
pub const CREATE_ANNOUNCEMENT_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_announcements_status ON announcements(status, publish_at)
";

/// Index for complaint listing by status.
pub const CREATE_COMPLAINT_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_complaints_status ON complaints(status)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_HOUSEHOLDS_TABLE,
    CREATE_RESIDENTS_TABLE,
    CREATE_DOCUMENTS_TABLE,
    CREATE_ANNOUNCEMENTS_TABLE,
    CREATE_COMPLAINTS_TABLE,
    CREATE_ACCOUNTS_TABLE,
    CREATE_OTP_TABLE,
    CREATE_RESIDENT_PUROK_INDEX,
    CREATE_RESIDENT_NAME_INDEX,
    CREATE_RESIDENT_HOUSEHOLD_INDEX,
    CREATE_DOCUMENT_STATUS_INDEX,
    CREATE_ANNOUNCEMENT_STATUS_INDEX,
    CREATE_COMPLAINT_STATUS_INDEX,
    CREATE_METADATA_TABLE,
];
