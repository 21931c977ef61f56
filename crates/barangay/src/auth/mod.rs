//! Account authentication.
//!
//! Sign-in is a password check against the stored hash, answered with a
//! signed access token (see [`token`]). Forgotten passwords are reset with a
//! one-time code sent by mail (see [`otp`]).

pub mod otp;
pub mod password;
pub mod token;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::mail::{Email, Mailer};
use crate::models::{check_password, Account, NewAccount};
use crate::storage::Storage;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenSigner};

/// Create an account, hashing its password.
///
/// # Errors
///
/// Returns a validation error for bad input, [`Error::Duplicate`] for a
/// taken username or email, or a database error.
pub fn create_account(
    storage: &Storage,
    input: &NewAccount,
    min_password_length: usize,
) -> Result<Account> {
    let account = input.normalized(min_password_length)?;
    storage.create_account(&account, &hash_password(&account.password))
}

/// Check a username and password.
///
/// Unknown usernames and wrong passwords give the same error. A correct
/// password on a deactivated account is refused. Successful sign-ins update
/// `last_login_at`.
///
/// # Errors
///
/// Returns [`Error::InvalidCredentials`], [`Error::Forbidden`] for a
/// deactivated account, or a database error.
pub fn authenticate(
    storage: &Storage,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<Account> {
    let username = username.trim().to_lowercase();
    let Some((account, hash)) = storage.account_credentials(&username)? else {
        debug!("Sign-in for unknown account {}", username);
        return Err(Error::InvalidCredentials);
    };

    if !verify_password(password, &hash) {
        warn!("Failed sign-in for {}", username);
        return Err(Error::InvalidCredentials);
    }
    if !account.active {
        return Err(Error::forbidden("account is deactivated"));
    }

    storage.record_login(account.id, now)?;
    info!("{} signed in", account.username);
    storage.get_account_by_id(account.id)
}

/// Change a signed-in account's password.
///
/// # Errors
///
/// Returns [`Error::InvalidCredentials`] if `current` is wrong, a validation
/// error if the new password is too short, or a database error.
pub fn change_password(
    storage: &Storage,
    account_id: i64,
    current: &str,
    new_password: &str,
    min_password_length: usize,
) -> Result<()> {
    let hash = storage.password_hash(account_id)?;
    if !verify_password(current, &hash) {
        return Err(Error::InvalidCredentials);
    }
    check_password(new_password, min_password_length)?;
    storage.set_password_hash(account_id, &hash_password(new_password))
}

/// Start a password reset by mailing a one-time code.
///
/// Succeeds without sending anything when no active account has this email,
/// so callers can't probe for registered addresses.
///
/// # Errors
///
/// Returns a database or mail error.
pub fn request_password_reset(
    storage: &Storage,
    mailer: &dyn Mailer,
    config: &Config,
    email: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let email = email.trim().to_lowercase();
    let account = match storage.find_account_by_email(&email)? {
        Some(account) if account.active => account,
        _ => {
            debug!("Password reset requested for unknown address");
            return Ok(());
        }
    };

    let code = otp::issue(storage, account.id, config.otp_ttl(), now)?;
    mailer.send(&Email {
        from: config.mail.from_address.clone(),
        to: account.email.clone(),
        subject: format!("Barangay {} password reset code", config.barangay.name),
        body: format!(
            "Your password reset code is {code}.\n\nIt expires in {} minutes. \
             If you did not ask to reset your password, you can ignore this message.\n",
            config.auth.otp_ttl_minutes
        ),
    })?;

    info!("Sent password reset code to account {}", account.username);
    Ok(())
}

/// Finish a password reset with the mailed code.
///
/// # Errors
///
/// Returns a validation error for a short password, [`Error::OtpInvalid`] or
/// [`Error::OtpExpired`] for a bad code (including an unknown email), or a
/// database error.
pub fn reset_password(
    storage: &Storage,
    config: &Config,
    email: &str,
    code: &str,
    new_password: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    check_password(new_password, config.auth.min_password_length)?;

    let email = email.trim().to_lowercase();
    let account = storage
        .find_account_by_email(&email)?
        .ok_or(Error::OtpInvalid)?;

    otp::verify(storage, account.id, code, config.auth.otp_max_attempts, now)?;
    storage.set_password_hash(account.id, &hash_password(new_password))?;

    info!("Password reset for account {}", account.username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::MemoryMailer;
    use crate::models::Role;

    fn setup() -> (Storage, Config) {
        let storage = Storage::open_in_memory().unwrap();
        let config = Config::default();
        let input = NewAccount {
            username: "Clerk".to_string(),
            email: "clerk@barangay.ph".to_string(),
            password: "initial-pass".to_string(),
            role: Role::Staff,
        };
        create_account(&storage, &input, config.auth.min_password_length).unwrap();
        (storage, config)
    }

    fn code_from(mailer: &MemoryMailer) -> String {
        let body = mailer.last_to("clerk@barangay.ph").unwrap().body;
        body.split_whitespace()
            .find_map(|word| {
                let word = word.trim_end_matches('.');
                (word.len() == 6 && word.chars().all(|c| c.is_ascii_digit()))
                    .then(|| word.to_string())
            })
            .unwrap()
    }

    #[test]
    fn test_authenticate() {
        let (storage, _) = setup();

        let account = authenticate(&storage, " CLERK ", "initial-pass", Utc::now()).unwrap();
        assert_eq!(account.username, "clerk");
        assert!(account.last_login_at.is_some());
    }

    #[test]
    fn test_authenticate_failures_look_alike() {
        let (storage, _) = setup();

        let wrong = authenticate(&storage, "clerk", "nope-nope", Utc::now()).unwrap_err();
        let unknown = authenticate(&storage, "ghost", "initial-pass", Utc::now()).unwrap_err();
        assert!(matches!(wrong, Error::InvalidCredentials));
        assert!(matches!(unknown, Error::InvalidCredentials));
    }

    #[test]
    fn test_authenticate_inactive() {
        let (storage, _) = setup();
        storage.set_account_active("clerk", false).unwrap();

        let err = authenticate(&storage, "clerk", "initial-pass", Utc::now()).unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn test_create_account_validates() {
        let (storage, config) = setup();
        let input = NewAccount {
            username: "new".to_string(),
            email: "new@barangay.ph".to_string(),
            password: "short".to_string(),
            role: Role::Staff,
        };
        let err = create_account(&storage, &input, config.auth.min_password_length).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_change_password() {
        let (storage, config) = setup();
        let id = storage.get_account("clerk").unwrap().id;
        let min = config.auth.min_password_length;

        let err = change_password(&storage, id, "wrong-pass", "brand-new-pass", min).unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));

        change_password(&storage, id, "initial-pass", "brand-new-pass", min).unwrap();
        assert!(authenticate(&storage, "clerk", "brand-new-pass", Utc::now()).is_ok());
        assert!(authenticate(&storage, "clerk", "initial-pass", Utc::now()).is_err());
    }

    #[test]
    fn test_password_reset_flow() {
        let (storage, config) = setup();
        let mailer = MemoryMailer::new();
        let now = Utc::now();

        request_password_reset(&storage, &mailer, &config, "Clerk@Barangay.PH", now).unwrap();
        let code = code_from(&mailer);

        reset_password(&storage, &config, "clerk@barangay.ph", &code, "reset-pass-1", now).unwrap();
        assert!(authenticate(&storage, "clerk", "reset-pass-1", now).is_ok());

        // The code is single-use
        let err = reset_password(&storage, &config, "clerk@barangay.ph", &code, "again-pass", now)
            .unwrap_err();
        assert!(matches!(err, Error::OtpInvalid));
    }

    #[test]
    fn test_reset_unknown_email_is_silent() {
        let (storage, config) = setup();
        let mailer = MemoryMailer::new();

        request_password_reset(&storage, &mailer, &config, "ghost@barangay.ph", Utc::now())
            .unwrap();
        assert!(mailer.sent().is_empty());

        let err = reset_password(
            &storage,
            &config,
            "ghost@barangay.ph",
            "123456",
            "whatever-pass",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::OtpInvalid));
    }

    #[test]
    fn test_reset_with_wrong_code() {
        let (storage, config) = setup();
        let mailer = MemoryMailer::new();
        let now = Utc::now();
        request_password_reset(&storage, &mailer, &config, "clerk@barangay.ph", now).unwrap();
        let code = code_from(&mailer);
        let wrong = if code == "000000" { "111111" } else { "000000" };

        let err = reset_password(&storage, &config, "clerk@barangay.ph", wrong, "reset-pass-1", now)
            .unwrap_err();
        assert!(matches!(err, Error::OtpInvalid));
        assert!(authenticate(&storage, "clerk", "initial-pass", now).is_ok());
    }
}
