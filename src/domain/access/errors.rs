//! Authentication, authorization and key administration errors.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, InstanceKey, PrincipalId, ValidationError};

/// Reasons a presented credential is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("API key is required")]
    MissingKey,

    #[error("Invalid API key")]
    InvalidKey,

    #[error("API key is inactive")]
    InactiveKey,

    #[error("API key has expired")]
    ExpiredKey,

    /// Key store could not be queried.
    #[error("Authentication unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingKey => "missing_key",
            AuthError::InvalidKey => "invalid_key",
            AuthError::InactiveKey => "inactive_key",
            AuthError::ExpiredKey => "expired_key",
            AuthError::Unavailable(_) => "auth_unavailable",
        }
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Unavailable(_))
    }
}

/// A valid principal asked for something outside its scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("Access to instance '{0}' is not allowed")]
    InstanceForbidden(InstanceKey),

    #[error("Super admin privileges required")]
    SuperAdminRequired,
}

impl AuthzError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthzError::InstanceForbidden(_) => "instance_forbidden",
            AuthzError::SuperAdminRequired => "super_admin_required",
        }
    }
}

/// Errors from issuing, updating or revoking keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiKeyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("API key {0} not found")]
    NotFound(PrincipalId),

    #[error("An API key cannot revoke itself")]
    CannotRevokeSelf,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ApiKeyError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiKeyError::Validation(_) => ErrorCode::ValidationFailed,
            ApiKeyError::NotFound(_) => ErrorCode::ApiKeyNotFound,
            ApiKeyError::CannotRevokeSelf => ErrorCode::Forbidden,
            ApiKeyError::Storage(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<DomainError> for ApiKeyError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => {
                ApiKeyError::Validation(ValidationError::invalid_format("api_key", err.message))
            }
            _ => ApiKeyError::Storage(err.to_string()),
        }
    }
}
