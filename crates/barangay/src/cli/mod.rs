//! Command-line interface for barangay.
//!
//! This module provides the CLI structure and command handlers for the
//! `brgy` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AccountCommand, AnnouncementsCommand, ConfigCommand, DocumentsCommand, RoleArg, ServeCommand,
    StatusCommand,
};

/// brgy - Barangay resident and records service
///
/// Keeps resident, household, document, announcement and complaint records
/// for a barangay office and serves them over a JSON API.
#[derive(Debug, Parser)]
#[command(name = "brgy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Show record counts
    Status(StatusCommand),

    /// Manage sign-in accounts
    #[command(subcommand)]
    Account(AccountCommand),

    /// Announcement maintenance
    #[command(subcommand)]
    Announcements(AnnouncementsCommand),

    /// Issued documents
    #[command(subcommand)]
    Documents(DocumentsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
