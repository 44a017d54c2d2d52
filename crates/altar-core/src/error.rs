//! Error types for the Altar platform.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AltarError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AltarError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// HTTP status code a response collaborator should use for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::AuthenticationFailed { .. } => 401,
            Self::AuthorizationDenied { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::AlreadyExists { .. } => 409,
            Self::Database(_) | Self::Crypto(_) | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::AuthenticationFailed { .. } => "UNAUTHORIZED",
            Self::AuthorizationDenied { .. } => "ACCESS_DENIED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists { .. } => "CONFLICT",
            Self::Database(_) | Self::Crypto(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type AltarResult<T> = Result<T, AltarError>;

/// Denial value handed to response formatting.
///
/// Messages for 5xx failures are replaced with a generic text so that
/// collaborator details never reach a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthFailure {
    pub status_code: u16,
    pub code: &'static str,
    pub message: String,
}

impl From<AltarError> for AuthFailure {
    fn from(err: AltarError) -> Self {
        let status_code = err.status_code();
        let code = err.code();
        let message = match err {
            AltarError::Validation { message } => message,
            AltarError::AuthenticationFailed { reason }
            | AltarError::AuthorizationDenied { reason } => reason,
            AltarError::NotFound { entity, .. } => format!("{entity} not found"),
            AltarError::AlreadyExists { entity } => format!("{entity} already exists"),
            AltarError::Database(_) | AltarError::Crypto(_) | AltarError::Internal(_) => {
                "Internal server error".into()
            }
        };
        Self {
            status_code,
            code,
            message,
        }
    }
}
