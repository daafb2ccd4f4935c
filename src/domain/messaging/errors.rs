use thiserror::Error;

use crate::domain::foundation::InstanceKey;

/// Reasons an outbound message was not handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Unsupported message type '{0}'")]
    UnsupportedType(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Instance '{0}' is not connected")]
    NotConnected(InstanceKey),

    #[error("Send failed: {0}")]
    SendFailed(String),
}

impl DispatchError {
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        DispatchError::InvalidPayload(reason.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::UnsupportedType(_) => "unsupported_type",
            DispatchError::InvalidPayload(_) => "invalid_payload",
            DispatchError::NotConnected(_) => "not_connected",
            DispatchError::SendFailed(_) => "send_failed",
        }
    }
}
