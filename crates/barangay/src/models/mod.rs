//! Record types for barangay.
//!
//! Each submodule holds one kind of record together with its input,
//! update and filter types. Storage and the HTTP layer both work in terms
//! of these types.

mod account;
mod announcement;
mod complaint;
mod document;
mod household;
mod resident;

pub use account::{check_password, Account, NewAccount, Role};
pub use announcement::{
    Announcement, AnnouncementCategory, AnnouncementStatus, AnnouncementUpdate, NewAnnouncement,
    RefreshOutcome,
};
pub use complaint::{
    Complaint, ComplaintCategory, ComplaintFilter, ComplaintStatus, ComplaintTransition,
    NewComplaint,
};
pub use document::{
    DocumentFilter, DocumentRequest, DocumentStatus, DocumentType, NewDocumentRequest,
};
pub use household::{Household, HouseholdDetail, HouseholdFilter, HouseholdUpdate, NewHousehold};
pub use resident::{
    age_on, identity_key, CivilStatus, NewResident, Resident, ResidentFilter, ResidentStatus,
    ResidentUpdate, Sex, SENIOR_AGE,
};
