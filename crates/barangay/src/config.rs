//! Configuration management for barangay.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::DocumentType;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "barangay";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "records.db";

/// Shortest accepted token secret, in bytes.
const MIN_SECRET_LEN: usize = 32;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `BARANGAY_`, sections split by `__`)
/// 2. TOML config file at `~/.config/barangay/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Details printed on issued documents.
    pub barangay: BarangayConfig,
    /// Document issuance configuration.
    pub documents: DocumentsConfig,
    /// Outgoing mail configuration.
    pub mail: MailConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/barangay/records.db`
    pub database_path: Option<PathBuf>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Seconds between announcement publish/archive sweeps.
    pub announcement_refresh_secs: u64,
}

/// Authentication configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret used to sign access tokens. Required to serve.
    pub token_secret: Option<String>,
    /// Access token lifetime in hours.
    pub token_ttl_hours: u32,
    /// One-time code lifetime in minutes.
    pub otp_ttl_minutes: u32,
    /// Wrong guesses allowed before a one-time code is burned.
    pub otp_max_attempts: u32,
    /// Minimum password length for admin accounts.
    pub min_password_length: usize,
}

/// Barangay details printed on certificates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarangayConfig {
    /// Barangay name.
    pub name: String,
    /// City or municipality.
    pub municipality: String,
    /// Province.
    pub province: String,
    /// Punong barangay who signs certificates.
    pub captain: String,
}

/// Document issuance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Fee for a barangay clearance, in centavos.
    pub clearance_fee: i64,
    /// Fee for a certificate of residency, in centavos.
    pub residency_fee: i64,
    /// Fee for a certificate of indigency, in centavos.
    pub indigency_fee: i64,
    /// Fee for a business clearance, in centavos.
    pub business_clearance_fee: i64,
    /// Days a released document stays valid.
    pub validity_days: u32,
}

/// Outgoing mail configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Sender address for system mail.
    pub from_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            announcement_refresh_secs: 60,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_hours: 12,
            otp_ttl_minutes: 10,
            otp_max_attempts: 5,
            min_password_length: 8,
        }
    }
}

impl Default for BarangayConfig {
    fn default() -> Self {
        Self {
            name: "San Isidro".to_string(),
            municipality: "San Jose".to_string(),
            province: "Batangas".to_string(),
            captain: "Juan dela Cruz".to_string(),
        }
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            clearance_fee: 10_000,
            residency_fee: 5_000,
            indigency_fee: 0, // Indigency certificates are free
            business_clearance_fee: 50_000,
            validity_days: 180,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: "no-reply@barangay.local".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("BARANGAY_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("port must be greater than 0"));
        }

        if self.server.announcement_refresh_secs == 0 {
            return Err(invalid("announcement_refresh_secs must be greater than 0"));
        }

        if self.auth.token_ttl_hours == 0 {
            return Err(invalid("token_ttl_hours must be greater than 0"));
        }

        if self.auth.otp_ttl_minutes == 0 {
            return Err(invalid("otp_ttl_minutes must be greater than 0"));
        }

        if self.auth.otp_max_attempts == 0 {
            return Err(invalid("otp_max_attempts must be greater than 0"));
        }

        if self.auth.min_password_length < 6 {
            return Err(invalid(format!(
                "min_password_length ({}) must be at least 6",
                self.auth.min_password_length
            )));
        }

        if let Some(secret) = &self.auth.token_secret {
            if secret.len() < MIN_SECRET_LEN {
                return Err(invalid(format!(
                    "token_secret must be at least {MIN_SECRET_LEN} bytes"
                )));
            }
        }

        let fees = [
            self.documents.clearance_fee,
            self.documents.residency_fee,
            self.documents.indigency_fee,
            self.documents.business_clearance_fee,
        ];
        if fees.iter().any(|fee| *fee < 0) {
            return Err(invalid("document fees cannot be negative"));
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the configured token secret.
    ///
    /// # Errors
    ///
    /// Returns an error if no secret is configured.
    pub fn token_secret(&self) -> Result<&str> {
        self.auth
            .token_secret
            .as_deref()
            .ok_or_else(|| invalid("auth.token_secret must be set to serve the API"))
    }

    /// Get the token lifetime as a chrono duration.
    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.auth.token_ttl_hours))
    }

    /// Get the one-time code lifetime as a chrono duration.
    #[must_use]
    pub fn otp_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.auth.otp_ttl_minutes))
    }

    /// Get the announcement sweep interval.
    #[must_use]
    pub fn announcement_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.server.announcement_refresh_secs)
    }

    /// Get the fee for a document type, in centavos.
    #[must_use]
    pub fn fee_for(&self, document_type: DocumentType) -> i64 {
        match document_type {
            DocumentType::BarangayClearance => self.documents.clearance_fee,
            DocumentType::CertificateOfResidency => self.documents.residency_fee,
            DocumentType::CertificateOfIndigency => self.documents.indigency_fee,
            DocumentType::BusinessClearance => self.documents.business_clearance_fee,
        }
    }

    /// Get the bind address as `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// A copy safe to print, with the token secret masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.auth.token_secret.is_some() {
            config.auth.token_secret = Some("********".to_string());
        }
        config
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> String {
        "x".repeat(MIN_SECRET_LEN)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.server.port, 8080);
        assert!(config.auth.token_secret.is_none());
        assert_eq!(config.documents.validity_days, 180);
    }

    #[test]
    fn test_default_auth_config() {
        let auth = AuthConfig::default();

        assert_eq!(auth.token_ttl_hours, 12);
        assert_eq!(auth.otp_ttl_minutes, 10);
        assert_eq!(auth.otp_max_attempts, 5);
        assert_eq!(auth.min_password_length, 8);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("port"));
    }

    #[test]
    fn test_validate_short_secret() {
        let mut config = Config::default();
        config.auth.token_secret = Some("short".to_string());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("token_secret"));

        config.auth.token_secret = Some(secret());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_otp_settings() {
        let mut config = Config::default();
        config.auth.otp_ttl_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.otp_max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_negative_fee() {
        let mut config = Config::default();
        config.documents.residency_fee = -1;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("fees"));
    }

    #[test]
    fn test_token_secret_required() {
        let config = Config::default();
        assert!(config.token_secret().is_err());

        let mut config = Config::default();
        config.auth.token_secret = Some(secret());
        assert_eq!(config.token_secret().unwrap(), secret());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config.database_path().to_string_lossy().contains("records.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/srv/brgy/db.sqlite"));

        assert_eq!(config.database_path(), PathBuf::from("/srv/brgy/db.sqlite"));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();

        assert_eq!(config.token_ttl(), chrono::Duration::hours(12));
        assert_eq!(config.otp_ttl(), chrono::Duration::minutes(10));
        assert_eq!(
            config.announcement_refresh_interval(),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_fee_for() {
        let config = Config::default();

        assert_eq!(config.fee_for(DocumentType::BarangayClearance), 10_000);
        assert_eq!(config.fee_for(DocumentType::CertificateOfIndigency), 0);
        assert_eq!(config.fee_for(DocumentType::BusinessClearance), 50_000);
    }

    #[test]
    fn test_bind_address() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_redacted_masks_secret() {
        let mut config = Config::default();
        assert!(config.redacted().auth.token_secret.is_none());

        config.auth.token_secret = Some(secret());
        let shown = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains(&secret()));
        assert!(shown.contains("********"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("barangay"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9090\n\n[barangay]\nname = \"Malinis\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.barangay.name, "Malinis");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_every_toml_section_applies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[auth]\notp_max_attempts = 5\n\n\
             [documents]\nvalidity_days = 90\nclearance_fee = 2500\n\n\
             [mail]\nfrom_address = \"office@malinis.gov.ph\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.auth.otp_max_attempts, 5);
        assert_eq!(config.documents.validity_days, 90);
        assert_eq!(config.documents.clearance_fee, 2500);
        assert_eq!(config.mail.from_address, "office@malinis.gov.ph");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_documents_config_deserialize() {
        let json = r#"{"clearance_fee": 2500, "validity_days": 90}"#;
        let documents: DocumentsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(documents.clearance_fee, 2500);
        assert_eq!(documents.validity_days, 90);
        assert_eq!(documents.residency_fee, 5_000);
    }
}
