//! Authentication gate — registration, enrollment confirmation, and login.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::{password, token, totp};
use crate::cli::globals::GlobalArgs;
use crate::store::{NewUser, SharedStore, UserStore};

const MIN_USERNAME_CHARS: usize = 3;
const MIN_PASSWORD_CHARS: usize = 8;

/// Successful login result.
#[derive(Debug)]
pub struct Session {
    /// Signed session token for the `Authorization` header.
    pub token: String,
    pub username: String,
}

/// Orchestrates password verification, TOTP verification, and enrollment
/// state transitions; mints session tokens on successful login.
pub struct AuthService {
    store: SharedStore,
    issuer: String,
    jwt_secret: SecretString,
    token_ttl_seconds: i64,
}

impl AuthService {
    #[must_use]
    pub fn new(store: SharedStore, globals: &GlobalArgs) -> Self {
        Self {
            store,
            issuer: globals.issuer.clone(),
            jwt_secret: globals.jwt_secret.clone(),
            token_ttl_seconds: globals.token_ttl_seconds,
        }
    }

    /// Register a new account in unenrolled state and return its TOTP
    /// provisioning material. The password hash never leaves the store.
    ///
    /// # Errors
    /// `Validation` for missing/short fields, `UsernameTaken` for a duplicate
    /// username, `Crypto`/`Store` for hashing or persistence failures.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<totp::Enrollment, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        if username.chars().count() < MIN_USERNAME_CHARS {
            return Err(AuthError::Validation(
                "Username must be at least 3 characters".to_string(),
            ));
        }

        // Argon2 is deliberately slow; keep it off the async reactor.
        let password_owned = password.to_string();
        let password_hash =
            tokio::task::spawn_blocking(move || password::hash_password(&password_owned))
                .await
                .map_err(|e| AuthError::Crypto(format!("hashing task: {e}")))??;

        let enrollment = totp::generate_enrollment(&self.issuer, username)?;

        self.store
            .create_user(NewUser {
                username: username.to_string(),
                password_hash,
                totp_secret: enrollment.secret_base32.clone(),
            })
            .await?;

        debug!("registered user {username} in unenrolled state");

        Ok(enrollment)
    }

    /// Confirm TOTP enrollment with the first code from the authenticator.
    /// Flips `totp_enabled`; the flag never reverts.
    ///
    /// # Errors
    /// `Validation` for missing fields, `UserNotFound` for an unknown
    /// username, `InvalidCode` when the code fails the ±1-step window.
    pub async fn confirm_enrollment(&self, username: &str, code: &str) -> Result<(), AuthError> {
        if username.is_empty() || code.is_empty() {
            return Err(AuthError::Validation(
                "Username and code are required".to_string(),
            ));
        }

        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !totp::verify_code(&user.totp_secret, code)? {
            return Err(AuthError::InvalidCode);
        }

        self.store.enable_totp(user.id).await?;

        debug!("2FA enrollment confirmed for {username}");

        Ok(())
    }

    /// Authenticate with password + TOTP code and mint a session token.
    ///
    /// Unknown username and wrong password both map to `InvalidCredentials`
    /// so callers cannot tell which factor failed; a wrong TOTP code is
    /// reported separately. The code is checked against the stored secret
    /// regardless of the enrollment flag, matching the enrollment-first flow.
    ///
    /// # Errors
    /// `Validation`, `InvalidCredentials`, `InvalidCode`, or `Crypto`/`Store`
    /// for hashing and persistence failures.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        code: &str,
    ) -> Result<Session, AuthError> {
        if username.is_empty() || password.is_empty() || code.is_empty() {
            return Err(AuthError::Validation(
                "Username, password, and 2FA code are required".to_string(),
            ));
        }

        let Some(user) = self.store.find_by_username(username).await? else {
            debug!("login attempt for unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        let password_owned = password.to_string();
        let stored_hash = user.password_hash.clone();
        let password_ok =
            tokio::task::spawn_blocking(move || {
                password::verify_password(&password_owned, &stored_hash)
            })
            .await
            .map_err(|e| AuthError::Crypto(format!("verify task: {e}")))??;

        if !password_ok {
            return Err(AuthError::InvalidCredentials);
        }

        if !totp::verify_code(&user.totp_secret, code)? {
            return Err(AuthError::InvalidCode);
        }

        let token = token::mint_session_token(
            user.id,
            &user.username,
            self.jwt_secret.expose_secret().as_bytes(),
            self.token_ttl_seconds,
        )?;

        Ok(Session {
            token,
            username: user.username,
        })
    }

    /// Verify a presented session token and resolve it to an identity.
    ///
    /// # Errors
    /// `InvalidToken` for a token that fails signature or expiry checks.
    pub fn verify_session(&self, token: &str) -> Result<token::SessionClaims, AuthError> {
        token::verify_session_token(token, self.jwt_secret.expose_secret().as_bytes())
    }

    #[must_use]
    pub fn user_id_from_claims(claims: &token::SessionClaims) -> Option<Uuid> {
        claims.sub.parse().ok()
    }
}
