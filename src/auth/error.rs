//! Authentication error taxonomy.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("username already exists")]
    UsernameTaken,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid 2FA code")]
    InvalidCode,

    #[error("access token required")]
    MissingToken,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::UsernameTaken,
            StoreError::NotFound => Self::UserNotFound,
            StoreError::Backend(_) => Self::Store(err),
        }
    }
}
