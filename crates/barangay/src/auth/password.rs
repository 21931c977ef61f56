//! Password hashing.
//!
//! Hashes are encoded as `blake3:<salt-hex>:<hash-hex>`, where the hash is a
//! BLAKE3 key derivation over the salt followed by the password.

use rand::RngCore;

/// Key derivation context for password hashes.
const PASSWORD_CONTEXT: &str = "barangay records 2026-10-19 account password";

/// Scheme tag at the start of every encoded hash.
const SCHEME: &str = "blake3";

/// Random salt length in bytes.
const SALT_LEN: usize = 16;

/// Hash a password with a fresh random salt.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = hex::encode(salt);
    let hash = derive(&salt, password);
    format!("{SCHEME}:{salt}:{}", hash.to_hex())
}

/// Check a password against an encoded hash.
///
/// Malformed hashes never verify. The final comparison is constant-time.
#[must_use]
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.splitn(3, ':');
    let (Some(SCHEME), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(expected) = blake3::Hash::from_hex(expected) else {
        return false;
    };
    // blake3::Hash equality is constant-time
    derive(salt, password) == expected
}

fn derive(salt: &str, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(PASSWORD_CONTEXT);
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize()
}
