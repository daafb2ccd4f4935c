//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `NEXUS_GATEWAY` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use nexus_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod engine;
mod error;
mod server;
mod session;
mod webhook;

pub use auth::{AuthConfig, MIN_BOOTSTRAP_KEY_LEN};
pub use database::DatabaseConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use session::SessionConfig;
pub use webhook::WebhookConfig;

use serde::Deserialize;

/// Root application configuration. Every section has defaults, so an empty
/// environment yields a runnable in-memory development gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `NEXUS_GATEWAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `NEXUS_GATEWAY__SESSION__QR_TIMEOUT_SECS=20` -> `session.qr_timeout_secs = 20`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("NEXUS_GATEWAY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.session.validate()?;
        self.engine.validate()?;
        self.webhook.validate()?;
        if self.server.request_timeout_secs <= self.session.qr_timeout_secs {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "NEXUS_GATEWAY__DATABASE__URL",
        "NEXUS_GATEWAY__SERVER__PORT",
        "NEXUS_GATEWAY__SERVER__ENVIRONMENT",
        "NEXUS_GATEWAY__SESSION__QR_TIMEOUT_SECS",
        "NEXUS_GATEWAY__WEBHOOK__URL",
        "NEXUS_GATEWAY__AUTH__BOOTSTRAP_ADMIN_KEY",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_empty_environment_loads_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.database.url().is_none());
        assert_eq!(config.session.qr_timeout_secs, 30);
        assert!(config.webhook.notifier_config().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("NEXUS_GATEWAY__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("NEXUS_GATEWAY__SERVER__PORT", "3000");
        env::set_var("NEXUS_GATEWAY__SESSION__QR_TIMEOUT_SECS", "20");
        env::set_var("NEXUS_GATEWAY__WEBHOOK__URL", "https://hooks.example.com");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.url(), Some("postgresql://test@localhost/test"));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.qr_timeout_secs, 20);
        assert!(config.webhook.notifier_config().is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("NEXUS_GATEWAY__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_out_of_range_qr_timeout_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("NEXUS_GATEWAY__SESSION__QR_TIMEOUT_SECS", "90");
        let result = AppConfig::load();
        clear_env();

        assert_eq!(
            result.unwrap().validate(),
            Err(ValidationError::QrTimeoutOutOfRange(90))
        );
    }

    #[test]
    fn test_request_timeout_must_outlast_qr_wait() {
        let mut config = AppConfig::default();
        config.server.request_timeout_secs = 30;
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }
}
