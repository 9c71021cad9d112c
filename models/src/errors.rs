// models/src/errors.rs

use thiserror::Error;

/// Shared domain error taxonomy. The HTTP layer maps each variant onto a
/// status code and the response envelope; nothing below the HTTP layer
/// knows about status codes.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: Vec<String>,
    },
    #[error("not authenticated: {0}")]
    Unauthenticated(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[cfg(feature = "sled-errors")]
    #[error(transparent)]
    Sled(#[from] sled::Error),
}

impl DomainError {
    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            message: message.into(),
            fields: vec![field.to_string()],
        }
    }

    pub fn validation(message: impl Into<String>, fields: Vec<String>) -> Self {
        DomainError::Validation {
            message: message.into(),
            fields,
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(format!("serialization error: {}", e))
    }
}

impl From<bcrypt::BcryptError> for DomainError {
    fn from(e: bcrypt::BcryptError) -> Self {
        DomainError::Internal(format!("password hashing error: {}", e))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
