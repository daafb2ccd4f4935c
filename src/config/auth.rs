//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Shortest bootstrap key accepted.
pub const MIN_BOOTSTRAP_KEY_LEN: usize = 24;

/// API-key authentication settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Super-admin key inserted at startup when its hash is unknown.
    #[serde(default)]
    pub bootstrap_admin_key: Option<SecretString>,
}

impl AuthConfig {
    /// The trimmed bootstrap key, if one is set.
    pub fn bootstrap_admin_key(&self) -> Option<&str> {
        self.bootstrap_admin_key
            .as_ref()
            .map(|k| k.expose_secret().trim())
            .filter(|k| !k.is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = self.bootstrap_admin_key() {
            if key.len() < MIN_BOOTSTRAP_KEY_LEN {
                return Err(ValidationError::BootstrapKeyTooShort(MIN_BOOTSTRAP_KEY_LEN));
            }
        }
        Ok(())
    }
}
