//! `barangay` - Resident and records service for barangay offices
//!
//! This library keeps resident, household, document, announcement and
//! complaint records in SQLite and serves them over an authenticated JSON
//! API.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mail;
pub mod models;
pub mod render;
pub mod server;
pub mod storage;
mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use mail::{Email, LogMailer, Mailer, MemoryMailer};
pub use server::{router, serve, AppState};
pub use storage::{RecordStats, Storage};
