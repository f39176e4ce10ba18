//! TOTP secret provisioning and code verification.
//!
//! Standard RFC 6238 parameters: HMAC-SHA1, 6 digits, 30 second step, and a
//! skew of one step so a code from the previous or next step is accepted.

use rand::{rngs::OsRng, RngCore};
use totp_rs::{Algorithm, Secret, TOTP};

use crate::auth::error::AuthError;

const SECRET_LENGTH_BYTES: usize = 20;
const TOTP_DIGITS: usize = 6;
const TOTP_SKEW: u8 = 1;
const TOTP_STEP_SECONDS: u64 = 30;

/// Freshly provisioned TOTP material returned to the user at registration.
#[derive(Debug)]
pub struct Enrollment {
    /// Base32 secret for manual entry into an authenticator app.
    pub secret_base32: String,
    /// `otpauth://totp/...` provisioning URI for QR enrollment.
    pub uri: String,
}

fn build(secret_bytes: Vec<u8>, issuer: &str, account: &str) -> Result<TOTP, AuthError> {
    TOTP::new(
        Algorithm::SHA1,
        TOTP_DIGITS,
        TOTP_SKEW,
        TOTP_STEP_SECONDS,
        secret_bytes,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| AuthError::Crypto(format!("TOTP init: {e}")))
}

/// Generate a new TOTP enrollment: random secret + otpauth URI.
///
/// Pure generation — no storage or network side effects.
///
/// # Errors
/// Returns `AuthError::Crypto` if the TOTP parameters are rejected (for
/// example a label the provisioning URI cannot carry).
pub fn generate_enrollment(issuer: &str, account: &str) -> Result<Enrollment, AuthError> {
    let mut secret_bytes = vec![0u8; SECRET_LENGTH_BYTES];
    OsRng.fill_bytes(&mut secret_bytes);

    let totp = build(secret_bytes, issuer, account)?;

    Ok(Enrollment {
        secret_base32: totp.get_secret_base32(),
        uri: totp.get_url(),
    })
}

/// Verify a code against a stored base32 secret at the current time,
/// accepting one step of clock skew in either direction.
///
/// # Errors
/// Returns `AuthError::Crypto` if the stored secret does not decode or the
/// system clock is unavailable.
pub fn verify_code(secret_base32: &str, code: &str) -> Result<bool, AuthError> {
    let secret_bytes = Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .map_err(|e| AuthError::Crypto(format!("secret decode: {e}")))?;

    // The label plays no part in code verification.
    let totp = build(secret_bytes, "verify", "user")?;

    totp.check_current(code)
        .map_err(|e| AuthError::Crypto(format!("TOTP check: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn enrollment_uri_carries_the_secret() {
        let enrollment = generate_enrollment("SecurePass", "alice").unwrap();

        assert!(enrollment.uri.starts_with("otpauth://totp/"));
        assert!(enrollment.uri.contains("SecurePass"));
        assert!(enrollment.uri.contains("alice"));
        assert!(enrollment
            .uri
            .contains(&format!("secret={}", enrollment.secret_base32)));
    }

    #[test]
    fn secret_has_twenty_bytes_of_entropy() {
        let enrollment = generate_enrollment("SecurePass", "alice").unwrap();
        let bytes = Secret::Encoded(enrollment.secret_base32).to_bytes().unwrap();
        assert_eq!(bytes.len(), 20);
    }

    #[test]
    fn secrets_are_unique_per_enrollment() {
        let first = generate_enrollment("SecurePass", "alice").unwrap();
        let second = generate_enrollment("SecurePass", "alice").unwrap();
        assert_ne!(first.secret_base32, second.secret_base32);
    }

    #[test]
    fn current_code_verifies() {
        let enrollment = generate_enrollment("SecurePass", "alice").unwrap();
        let secret_bytes = Secret::Encoded(enrollment.secret_base32.clone())
            .to_bytes()
            .unwrap();
        let totp = build(secret_bytes, "SecurePass", "alice").unwrap();
        let code = totp.generate_current().unwrap();

        assert!(verify_code(&enrollment.secret_base32, &code).unwrap());
    }

    #[test]
    fn wrong_code_is_rejected() {
        let enrollment = generate_enrollment("SecurePass", "alice").unwrap();
        assert!(!verify_code(&enrollment.secret_base32, "000000").unwrap());
    }

    #[test]
    fn malformed_secret_is_an_error() {
        assert!(verify_code("not base32!!", "123456").is_err());
    }

    #[test]
    fn acceptance_window_is_one_step_each_way() {
        let enrollment = generate_enrollment("SecurePass", "alice").unwrap();
        let secret_bytes = Secret::Encoded(enrollment.secret_base32)
            .to_bytes()
            .unwrap();
        let totp = build(secret_bytes, "SecurePass", "alice").unwrap();

        // Code minted in step 100 (30s steps).
        let minted_at = 100 * TOTP_STEP_SECONDS;
        let code = totp.generate(minted_at);

        // Accepted in steps 99, 100, 101.
        assert!(totp.check(&code, minted_at - TOTP_STEP_SECONDS));
        assert!(totp.check(&code, minted_at));
        assert!(totp.check(&code, minted_at + TOTP_STEP_SECONDS));

        // Rejected at two steps away in either direction.
        assert!(!totp.check(&code, minted_at - 2 * TOTP_STEP_SECONDS));
        assert!(!totp.check(&code, minted_at + 2 * TOTP_STEP_SECONDS));
    }
}
