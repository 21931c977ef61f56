//! `brgy` - CLI for barangay
//!
//! This binary runs the records API and provides maintenance commands for
//! accounts, announcements and issued documents.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;

use anyhow::Context;
use chrono::{Local, Utc};
use clap::Parser;

use barangay::cli::{
    AccountCommand, AnnouncementsCommand, Cli, Command, ConfigCommand, DocumentsCommand,
    ServeCommand,
};
use barangay::models::NewAccount;
use barangay::{auth, init_logging, render, Config, Storage};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, serve_cmd),
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Account(account_cmd) => handle_account(&config, account_cmd),
        Command::Announcements(cmd) => handle_announcements(&config, &cmd),
        Command::Documents(cmd) => handle_documents(&config, cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening database {}", path.display()))
}

fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(barangay::serve(config))?;
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats(Local::now().date_naive())?;

    if json {
        let status = serde_json::json!({
            "barangay": config.barangay.name,
            "database_path": config.database_path(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("Barangay {} records", config.barangay.name);
        println!("------------------------------");
        println!("Database:            {}", config.database_path().display());
        println!("Database size:       {} bytes", stats.db_size_bytes);
        println!();
        println!("Residents (active):  {}", stats.residents);
        println!("  Male / female:     {} / {}", stats.male, stats.female);
        println!("  Voters:            {}", stats.voters);
        println!("  Seniors:           {}", stats.seniors);
        println!("  PWD:               {}", stats.pwd);
        println!("Households:          {}", stats.households);
        println!("Pending documents:   {}", stats.pending_documents);
        println!("Released documents:  {}", stats.released_documents);
        println!("Open complaints:     {}", stats.open_complaints);
        println!("Live announcements:  {}", stats.published_announcements);
    }
    Ok(())
}

fn handle_account(config: &Config, cmd: AccountCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;

    match cmd {
        AccountCommand::Create {
            username,
            email,
            password,
            role,
        } => {
            let input = NewAccount {
                username,
                email,
                password,
                role: role.into(),
            };
            let account =
                auth::create_account(&storage, &input, config.auth.min_password_length)?;
            println!("Created {} account {}", account.role, account.username);
        }
        AccountCommand::List { json } => {
            let accounts = storage.list_accounts()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
            } else if accounts.is_empty() {
                println!("No accounts. Create one with `brgy account create`.");
            } else {
                println!("{:<24} {:<7} {:<8} EMAIL", "USERNAME", "ROLE", "ACTIVE");
                for account in accounts {
                    println!(
                        "{:<24} {:<7} {:<8} {}",
                        account.username,
                        account.role,
                        if account.active { "yes" } else { "no" },
                        account.email
                    );
                }
            }
        }
        AccountCommand::Deactivate { username } => {
            let account = storage.set_account_active(&username, false)?;
            println!("Deactivated {}", account.username);
        }
    }
    Ok(())
}

fn handle_announcements(config: &Config, cmd: &AnnouncementsCommand) -> anyhow::Result<()> {
    match cmd {
        AnnouncementsCommand::Refresh => {
            let storage = open_storage(config)?;
            let outcome = storage.refresh_announcements(Utc::now())?;
            println!(
                "Published {}, archived {}",
                outcome.published, outcome.archived
            );
        }
    }
    Ok(())
}

fn handle_documents(config: &Config, cmd: DocumentsCommand) -> anyhow::Result<()> {
    match cmd {
        DocumentsCommand::Export { output } => {
            let storage = open_storage(config)?;
            let rows = storage.released_documents()?;
            let csv = render::export_csv(&rows);
            match output {
                Some(path) => {
                    fs::write(&path, csv)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("Exported {} documents to {}", rows.len(), path.display());
                }
                None => print!("{csv}"),
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.bind_address());
                println!(
                    "  Refresh interval:   {}s",
                    config.server.announcement_refresh_secs
                );
                println!();
                println!("[Auth]");
                println!(
                    "  Token secret:       {}",
                    if config.auth.token_secret.is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
                println!("  Token TTL (hours):  {}", config.auth.token_ttl_hours);
                println!("  OTP TTL (minutes):  {}", config.auth.otp_ttl_minutes);
                println!("  OTP attempts:       {}", config.auth.otp_max_attempts);
                println!();
                println!("[Barangay]");
                println!("  Name:               {}", config.barangay.name);
                println!("  Municipality:       {}", config.barangay.municipality);
                println!("  Province:           {}", config.barangay.province);
                println!("  Captain:            {}", config.barangay.captain);
                println!();
                println!("[Documents]");
                println!("  Validity (days):    {}", config.documents.validity_days);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
