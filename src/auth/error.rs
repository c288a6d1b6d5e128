use std::time::Duration;
use thiserror::Error;

/// Failures raised by a token store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token store timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

/// Closed set of failures the token lifecycle can produce
#[derive(Debug, Error)]
pub enum AuthError {
    /// Signing secret or store not initialized
    #[error("auth configuration unavailable: {0}")]
    ConfigUnavailable(String),

    /// Unknown user or wrong password, deliberately indistinguishable
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Malformed, badly signed, not yet valid, or expired token
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Well-formed token that is no longer the principal's active one
    #[error("token revoked or superseded")]
    RevokedOrSuperseded,

    #[error("token store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}
