//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid listen address '{0}'")]
    InvalidListenAddress(String),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Bootstrap admin key is too short (minimum {0} characters)")]
    BootstrapKeyTooShort(usize),

    #[error("QR timeout must be between 15 and 45 seconds, got {0}")]
    QrTimeoutOutOfRange(u64),

    #[error("Reconnect delay must be between 1 and 60 seconds, got {0}")]
    ReconnectDelayOutOfRange(u64),

    #[error("Login window must be between 60 and 600 seconds, got {0}")]
    LoginWindowOutOfRange(u64),

    #[error("Event queue capacity must be between 1 and 65536, got {0}")]
    InvalidQueueCapacity(usize),

    #[error("{0} must be an http(s) URL")]
    InvalidUrl(&'static str),
}
