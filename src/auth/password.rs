//! Password hashing and verification using Argon2id.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::auth::error::AuthError;

/// Hash a plaintext password into an Argon2id PHC-format string with a fresh
/// random salt. The default parameters are deliberately slow; run this on a
/// blocking thread.
///
/// # Errors
/// Returns `AuthError::Crypto` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Crypto(format!("hash error: {e}")))
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch. The comparison is
/// constant-time with respect to the stored hash.
///
/// # Errors
/// Returns `AuthError::Crypto` if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    let argon2 = Argon2::default();
    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}
