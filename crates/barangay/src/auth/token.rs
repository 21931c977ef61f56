//! Signed access tokens.
//!
//! Tokens are JWT-shaped: `base64url(header).base64url(claims).base64url(mac)`
//! with no padding. The MAC is a keyed BLAKE3 hash of the first two segments,
//! keyed by a key derived from the configured secret. There is no refresh;
//! a token is good until `exp`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Account, Role};

/// Key derivation context for the signing key.
const TOKEN_CONTEXT: &str = "barangay records 2026-10-19 access token signing key";

/// Signature algorithm name carried in the header.
pub const ALGORITHM: &str = "B3K";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: i64,
    /// Account username.
    pub username: String,
    /// Role at the time the token was issued.
    pub role: Role,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expires at, seconds since the epoch.
    pub exp: i64,
}

/// Issues and verifies access tokens.
pub struct TokenSigner {
    key: [u8; 32],
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Create a signer from the configured secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: blake3::derive_key(TOKEN_CONTEXT, secret.as_bytes()),
        }
    }

    /// Issue a token for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be serialized.
    pub fn issue(&self, account: &Account, ttl: Duration, now: DateTime<Utc>) -> Result<String> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            sub: account.id,
            username: account.username.clone(),
            role: account.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let mac = self.mac(&signing_input);
        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(mac.as_bytes())
        ))
    }

    /// Verify a token and return its claims.
    ///
    /// Checks the shape, the header, the MAC (in constant time) and the
    /// expiry, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] describing the first failed check.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(Error::unauthorized("malformed token"));
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != ALGORITHM || header.typ != "JWT" {
            return Err(Error::unauthorized("unsupported token algorithm"));
        }

        let signature: [u8; 32] = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| Error::unauthorized("malformed token signature"))?;
        let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
        // blake3::Hash equality is constant-time
        if self.mac(signing_input) != blake3::Hash::from(signature) {
            return Err(Error::unauthorized("invalid token signature"));
        }

        let claims: Claims = decode_segment(claims_b64)?;
        if claims.exp <= now.timestamp() {
            return Err(Error::unauthorized("token expired"));
        }
        Ok(claims)
    }

    fn mac(&self, signing_input: &str) -> blake3::Hash {
        blake3::keyed_hash(&self.key, signing_input.as_bytes())
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| Error::unauthorized("malformed token"))?;
    serde_json::from_slice(&bytes).map_err(|_| Error::unauthorized("malformed token"))
}
