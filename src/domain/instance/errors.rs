//! Session lifecycle errors.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, InstanceKey};

/// Errors raised by session lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Instance '{0}' is not connected")]
    NotConnected(InstanceKey),

    #[error("Instance '{0}' is already connected")]
    AlreadyConnected(InstanceKey),

    #[error("Pairing failed: {0}")]
    PairingFailed(String),

    #[error("No QR code received within {0} seconds")]
    Timeout(u64),

    #[error("Login attempt for '{0}' was cancelled")]
    Cancelled(InstanceKey),

    #[error("Instance '{0}' not found")]
    NotFound(InstanceKey),

    #[error("Engine request failed: {0}")]
    EngineFailed(String),
}

impl SessionError {
    pub fn pairing_failed(reason: impl Into<String>) -> Self {
        SessionError::PairingFailed(reason.into())
    }

    /// Wire-level error code used in HTTP bodies.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NotConnected(_) => "not_connected",
            SessionError::AlreadyConnected(_) => "already_connected",
            SessionError::PairingFailed(_) => "pairing_failed",
            SessionError::Timeout(_) => "timeout",
            SessionError::Cancelled(_) => "cancelled",
            SessionError::NotFound(_) => "not_found",
            SessionError::EngineFailed(_) => "engine_error",
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            SessionError::NotFound(_) => ErrorCode::InstanceNotFound,
            SessionError::NotConnected(_) | SessionError::AlreadyConnected(_) => {
                ErrorCode::InvalidStateTransition
            }
            SessionError::PairingFailed(_) | SessionError::EngineFailed(_) => ErrorCode::EngineError,
            SessionError::Timeout(_) | SessionError::Cancelled(_) => ErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> InstanceKey {
        InstanceKey::new("sales").unwrap()
    }

    #[test]
    fn codes_are_snake_case() {
        assert_eq!(SessionError::NotConnected(key()).code(), "not_connected");
        assert_eq!(SessionError::Timeout(30).code(), "timeout");
        assert_eq!(SessionError::Cancelled(key()).code(), "cancelled");
        assert_eq!(SessionError::EngineFailed("down".into()).code(), "engine_error");
    }

    #[test]
    fn messages_name_the_instance() {
        assert_eq!(
            SessionError::AlreadyConnected(key()).to_string(),
            "Instance 'sales' is already connected"
        );
    }
}
