//! Session token issuance and verification (HS256 JWT).
//!
//! The signing secret is process-wide and read-only after startup: the login
//! path signs with it, the bearer-auth path verifies with it.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::AuthError;

/// Claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject — user id (UUID string).
    pub sub: String,
    /// Username, echoed back to the frontend.
    pub username: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
}

/// Mint a signed session token for the user.
///
/// # Errors
/// Returns `AuthError::Crypto` if encoding fails.
pub fn mint_session_token(
    user_id: Uuid,
    username: &str,
    secret: &[u8],
    ttl_seconds: i64,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        iat: now,
        exp: now + ttl_seconds,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(secret);
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Decode and verify a session token: signature and expiry.
///
/// Expiry is evaluated against server time with zero leeway so a token is
/// rejected deterministically the moment it lapses. Any failure — tampering,
/// wrong key, expiry — maps to `AuthError::InvalidToken`.
///
/// # Errors
/// Returns `AuthError::InvalidToken` for any token that does not verify.
pub fn verify_session_token(token: &str, secret: &[u8]) -> Result<SessionClaims, AuthError> {
    let key = DecodingKey::from_secret(secret);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-signing-secret";

    #[test]
    fn token_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = mint_session_token(user_id, "alice", SECRET, 3600).unwrap();
        let claims = verify_session_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn jti_is_unique() {
        let user_id = Uuid::new_v4();
        let first = mint_session_token(user_id, "alice", SECRET, 3600).unwrap();
        let second = mint_session_token(user_id, "alice", SECRET, 3600).unwrap();

        let c1 = verify_session_token(&first, SECRET).unwrap();
        let c2 = verify_session_token(&second, SECRET).unwrap();
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = mint_session_token(Uuid::new_v4(), "alice", SECRET, -1).unwrap();
        let result = verify_session_token(&token, SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = mint_session_token(Uuid::new_v4(), "alice", SECRET, 3600).unwrap();

        // Flip one byte in the payload section.
        let mut bytes = token.into_bytes();
        let dot = bytes.iter().position(|&b| b == b'.').unwrap();
        bytes[dot + 1] = if bytes[dot + 1] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        let result = verify_session_token(&tampered, SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = mint_session_token(Uuid::new_v4(), "alice", SECRET, 3600).unwrap();
        let result = verify_session_token(&token, b"another-secret");
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }
}
