//! One-time codes for password resets.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::Storage;

/// Key derivation context for stored code hashes.
const OTP_CONTEXT: &str = "barangay records 2026-10-19 one-time code";

/// Number of digits in a code.
pub const OTP_DIGITS: usize = 6;

/// Generate a random numeric code.
#[must_use]
pub fn generate_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{code:06}")
}

/// Hash of a code, bound to the account it was issued for.
fn hash_code(account_id: i64, code: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(OTP_CONTEXT);
    hasher.update(&account_id.to_le_bytes());
    hasher.update(code.as_bytes());
    hasher.finalize()
}

/// Issue a fresh code for an account, replacing any outstanding one.
///
/// Returns the plain code for delivery; only its hash is stored.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn issue(
    storage: &Storage,
    account_id: i64,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String> {
    let code = generate_code();
    let hash = hash_code(account_id, &code);
    storage.put_otp(account_id, hash.to_hex().as_str(), now + ttl, now)?;
    Ok(code)
}

/// Check a code and consume it on success.
///
/// A wrong code counts against `max_attempts`; once those are used up the
/// code is dead even if the right one is entered later.
///
/// # Errors
///
/// Returns [`Error::OtpExpired`] for an expired code and
/// [`Error::OtpInvalid`] for a missing, consumed, exhausted or wrong one.
pub fn verify(
    storage: &Storage,
    account_id: i64,
    code: &str,
    max_attempts: u32,
    now: DateTime<Utc>,
) -> Result<()> {
    let record = storage.get_otp(account_id)?.ok_or(Error::OtpInvalid)?;

    if record.consumed {
        return Err(Error::OtpInvalid);
    }
    if record.expires_at <= now {
        return Err(Error::OtpExpired);
    }
    if record.attempts >= max_attempts {
        debug!("One-time code for account {} has no attempts left", account_id);
        return Err(Error::OtpInvalid);
    }

    let expected = blake3::Hash::from_hex(&record.code_hash)
        .map_err(|e| Error::internal(format!("corrupt one-time code hash: {e}")))?;
    // blake3::Hash equality is constant-time
    if hash_code(account_id, code.trim()) != expected {
        storage.record_otp_attempt(account_id)?;
        return Err(Error::OtpInvalid);
    }

    storage.consume_otp(account_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewAccount, Role};

    fn setup() -> (Storage, i64) {
        let storage = Storage::open_in_memory().unwrap();
        let input = NewAccount {
            username: "clerk".to_string(),
            email: "clerk@barangay.ph".to_string(),
            password: String::new(),
            role: Role::Staff,
        };
        let id = storage.create_account(&input, "h").unwrap().id;
        (storage, id)
    }

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), OTP_DIGITS);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_issue_and_verify_once() {
        let (storage, id) = setup();
        let now = Utc::now();
        let code = issue(&storage, id, Duration::minutes(10), now).unwrap();

        let stored = storage.get_otp(id).unwrap().unwrap();
        assert_ne!(stored.code_hash, code);

        verify(&storage, id, &code, 5, now).unwrap();
        assert!(matches!(
            verify(&storage, id, &code, 5, now).unwrap_err(),
            Error::OtpInvalid
        ));
    }

    #[test]
    fn test_expired_code() {
        let (storage, id) = setup();
        let now = Utc::now();
        let code = issue(&storage, id, Duration::minutes(10), now).unwrap();

        let err = verify(&storage, id, &code, 5, now + Duration::minutes(10)).unwrap_err();
        assert!(matches!(err, Error::OtpExpired));
    }

    #[test]
    fn test_attempts_exhausted() {
        let (storage, id) = setup();
        let now = Utc::now();
        let code = issue(&storage, id, Duration::minutes(10), now).unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..3 {
            assert!(matches!(
                verify(&storage, id, wrong, 3, now).unwrap_err(),
                Error::OtpInvalid
            ));
        }
        assert_eq!(storage.get_otp(id).unwrap().unwrap().attempts, 3);
        assert!(verify(&storage, id, &code, 3, now).is_err());
    }

    #[test]
    fn test_reissue_invalidates_previous() {
        let (storage, id) = setup();
        let now = Utc::now();
        let first = issue(&storage, id, Duration::minutes(10), now).unwrap();
        let second = issue(&storage, id, Duration::minutes(10), now).unwrap();

        if first != second {
            assert!(verify(&storage, id, &first, 5, now).is_err());
        }
        verify(&storage, id, &second, 5, now).unwrap();
    }

    #[test]
    fn test_no_code_issued() {
        let (storage, id) = setup();
        assert!(matches!(
            verify(&storage, id, "123456", 5, Utc::now()).unwrap_err(),
            Error::OtpInvalid
        ));
    }
}
