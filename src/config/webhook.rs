//! Webhook target configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::engine::is_http_url;
use super::error::ValidationError;
use crate::adapters::events::WebhookNotifierConfig;

/// Optional push target for gateway events.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: Option<String>,

    /// HMAC-SHA256 signing secret.
    #[serde(default)]
    pub secret: Option<SecretString>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl WebhookConfig {
    /// Notifier settings, or `None` when no target is configured.
    pub fn notifier_config(&self) -> Option<WebhookNotifierConfig> {
        let url = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        let mut config = WebhookNotifierConfig::new(url)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(secret) = &self.secret {
            config = config.with_secret(secret.clone());
        }
        Some(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            if !is_http_url(url) {
                return Err(ValidationError::InvalidUrl("webhook.url"));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            secret: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}
