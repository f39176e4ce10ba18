//! HTTP handlers and shared bearer-auth helpers.

pub mod health;
pub mod login;
pub mod register;
pub mod vault;
pub mod verify_2fa;

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{AuthError, AuthService};

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn authenticate(headers: &HeaderMap, auth: &AuthService) -> Result<Uuid, AuthError> {
    let token = extract_bearer_token(headers).ok_or(AuthError::MissingToken)?;
    let claims = auth.verify_session(&token)?;
    AuthService::user_id_from_claims(&claims).ok_or(AuthError::InvalidToken)
}

/// Resolve the bearer credential to the authenticated user id.
///
/// An absent credential is distinct from a presented-but-invalid one: callers
/// redirect to login on `401` and surface an error on `403`.
pub(crate) fn require_auth(
    headers: &HeaderMap,
    auth: &AuthService,
) -> Result<Uuid, (StatusCode, String)> {
    match authenticate(headers, auth) {
        Ok(user_id) => Ok(user_id),
        Err(AuthError::MissingToken) => Err((
            StatusCode::UNAUTHORIZED,
            "Access token required".to_string(),
        )),
        Err(err) => {
            debug!("rejected session token: {err}");
            Err((
                StatusCode::FORBIDDEN,
                "Invalid or expired token".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::globals::GlobalArgs;
    use crate::store::{memory::MemoryStore, SharedStore};
    use axum::http::HeaderValue;
    use secrecy::SecretString;
    use std::sync::Arc;

    fn auth_service() -> AuthService {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let globals = GlobalArgs::new(
            SecretString::from("test-signing-secret".to_string()),
            "SecurePass".to_string(),
            3600,
            "http://localhost:3000".to_string(),
        );
        AuthService::new(store, &globals)
    }

    #[test]
    fn extract_bearer_token_strips_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def".to_string()));
    }

    #[test]
    fn extract_bearer_token_rejects_empty_and_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        let headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn missing_token_is_unauthorized() {
        let auth = auth_service();
        let headers = HeaderMap::new();
        let err = require_auth(&headers, &auth).unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn presented_but_invalid_token_is_forbidden() {
        let auth = auth_service();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-jwt"));
        let err = require_auth(&headers, &auth).unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }
}
