//! Bearer token issuing and verification
//!
//! # Architecture
//!
//! Tokens are stateless and self-contained; there is no server-side
//! session store and no revocation before expiry.
//!
//! # Token format
//!
//! `base64url(claims_json) . hex(sha256(payload || signing_key))`
//!
//! - Payload: URL-safe base64 (no padding) of the claims JSON
//! - Signature: SHA-256 over the encoded payload concatenated with the
//!   signing key, as 64 hex characters
//! - Claims: `sub` (user guid), `art` (artist flag), `iat`, `exp`
//!   (Unix seconds)
//!
//! The signature is checked before the payload is decoded, so any byte
//! change in either part surfaces as `InvalidSignature` rather than a
//! parse error.

use crate::error::AuthError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

// ========================================
// Claims
// ========================================

/// Claims carried inside a token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: user guid
    pub sub: String,
    /// Artist role flag at issue time
    pub art: bool,
    /// Issued-at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds); `exp <= now` means expired
    pub exp: i64,
}

// ========================================
// Token Service
// ========================================

/// Issues and verifies bearer tokens with a shared signing key
///
/// The key is an explicit constructor argument; callers load it before
/// first use (startup aborts if the key cannot be obtained).
#[derive(Debug, Clone)]
pub struct TokenService {
    signing_key: String,
    ttl_seconds: i64,
}

impl TokenService {
    pub fn new(signing_key: String, ttl_seconds: i64) -> Self {
        TokenService {
            signing_key,
            ttl_seconds,
        }
    }

    /// Default token lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a token for a user with the service default lifetime
    pub fn issue(&self, user_guid: &str, is_artist: bool) -> String {
        self.issue_with_ttl(user_guid, is_artist, self.ttl_seconds)
    }

    /// Issue a token with an explicit lifetime
    ///
    /// `ttl_seconds = 0` produces a token that is already expired.
    pub fn issue_with_ttl(&self, user_guid: &str, is_artist: bool, ttl_seconds: i64) -> String {
        let now = Utc::now().timestamp();
        // json! with default serde_json sorts keys, so the payload
        // bytes are deterministic for identical claims
        let claims = json!({
            "sub": user_guid,
            "art": is_artist,
            "iat": now,
            "exp": now + ttl_seconds,
        });

        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        let signature = sign_payload(&payload, &self.signing_key);

        format!("{}.{}", payload, signature)
    }

    /// Verify a token and return its claims
    ///
    /// Check order:
    /// 1. Structure: exactly one `.` separator, else `MalformedToken`
    /// 2. Signature over the encoded payload, else `InvalidSignature`
    /// 3. Payload decode and claims parse, else `MalformedToken`
    /// 4. Expiry: `exp <= now` is `ExpiredToken`
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::MalformedToken)?;
        if payload.is_empty() || signature.is_empty() || signature.contains('.') {
            return Err(AuthError::MalformedToken);
        }

        let calculated = sign_payload(payload, &self.signing_key);
        if signature != calculated {
            return Err(AuthError::InvalidSignature);
        }

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::MalformedToken)?;
        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| AuthError::MalformedToken)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }
}

/// SHA-256 over the encoded payload concatenated with the signing key,
/// as 64 hex characters
fn sign_payload(payload: &str, signing_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(signing_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ========================================
// Tests
// ========================================
