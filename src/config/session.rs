//! Session lifecycle and event bus tuning

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::SessionRegistryConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// How long a connect call waits for the first QR code.
    #[serde(default = "default_qr_timeout")]
    pub qr_timeout_secs: u64,

    /// Backoff before the single reconnect attempt.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    /// How long a login nobody is waiting on (phone pairing, a reconnect
    /// that needs a new QR) may stay unpaired before it is torn down.
    #[serde(default = "default_login_window")]
    pub login_window_secs: u64,

    /// Per-listener event queue length.
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
}

impl SessionConfig {
    pub fn registry_config(&self) -> SessionRegistryConfig {
        SessionRegistryConfig {
            qr_timeout: Duration::from_secs(self.qr_timeout_secs),
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
            login_window: Duration::from_secs(self.login_window_secs),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(15..=45).contains(&self.qr_timeout_secs) {
            return Err(ValidationError::QrTimeoutOutOfRange(self.qr_timeout_secs));
        }
        if !(1..=60).contains(&self.reconnect_delay_secs) {
            return Err(ValidationError::ReconnectDelayOutOfRange(self.reconnect_delay_secs));
        }
        if !(60..=600).contains(&self.login_window_secs) {
            return Err(ValidationError::LoginWindowOutOfRange(self.login_window_secs));
        }
        if !(1..=65_536).contains(&self.event_queue_capacity) {
            return Err(ValidationError::InvalidQueueCapacity(self.event_queue_capacity));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            qr_timeout_secs: default_qr_timeout(),
            reconnect_delay_secs: default_reconnect_delay(),
            login_window_secs: default_login_window(),
            event_queue_capacity: default_event_queue_capacity(),
        }
    }
}

fn default_qr_timeout() -> u64 {
    30
}

fn default_reconnect_delay() -> u64 {
    2
}

fn default_login_window() -> u64 {
    120
}

fn default_event_queue_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_registry_defaults() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.registry_config(), SessionRegistryConfig::default());
        assert_eq!(config.event_queue_capacity, 256);
    }

    #[test]
    fn test_qr_timeout_bounds() {
        for (secs, ok) in [(14, false), (15, true), (45, true), (46, false)] {
            let config = SessionConfig {
                qr_timeout_secs: secs,
                ..Default::default()
            };
            assert_eq!(config.validate().is_ok(), ok, "qr_timeout_secs = {}", secs);
        }
    }

    #[test]
    fn test_login_window_bounds() {
        for (secs, ok) in [(59, false), (60, true), (600, true), (601, false)] {
            let config = SessionConfig {
                login_window_secs: secs,
                ..Default::default()
            };
            assert_eq!(config.validate().is_ok(), ok, "login_window_secs = {}", secs);
        }
    }

    #[test]
    fn test_zero_queue_is_rejected() {
        let config = SessionConfig {
            event_queue_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidQueueCapacity(0)));
    }
}
