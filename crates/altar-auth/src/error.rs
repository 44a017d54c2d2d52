//! Authentication error types.

use altar_core::error::AltarError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingAuthorization,

    #[error("Invalid token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token type")]
    WrongTokenType,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for AltarError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Crypto(msg) => AltarError::Crypto(msg),
            other => AltarError::AuthenticationFailed {
                reason: other.to_string(),
            },
        }
    }
}
