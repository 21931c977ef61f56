//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::models::Role;

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind (overrides `server.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides `server.port`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Account management commands.
#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Create a sign-in account
    Create {
        /// Login name (3-32 of a-z, 0-9, `_` and `.`)
        #[arg(short, long)]
        username: String,

        /// Email address, used for password resets
        #[arg(short, long)]
        email: String,

        /// Initial password
        #[arg(short, long)]
        password: String,

        /// Account role
        #[arg(short, long, value_enum, default_value = "staff")]
        role: RoleArg,
    },

    /// List accounts
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Deactivate an account so it can no longer sign in
    Deactivate {
        /// Login name
        username: String,
    },
}

/// Announcement commands.
#[derive(Debug, Subcommand)]
pub enum AnnouncementsCommand {
    /// Publish and archive announcements that are due
    Refresh,
}

/// Document commands.
#[derive(Debug, Subcommand)]
pub enum DocumentsCommand {
    /// Export released documents as CSV
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Account role for CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Full access, including account management and deletes
    Admin,
    /// Day-to-day record keeping
    Staff,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Self::Admin,
            RoleArg::Staff => Self::Staff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_arg_conversion() {
        assert_eq!(Role::from(RoleArg::Admin), Role::Admin);
        assert_eq!(Role::from(RoleArg::Staff), Role::Staff);
    }
}
