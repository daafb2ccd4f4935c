//! Webhook notifier - pushes every gateway event to one configured URL.
//!
//! Delivery is a single best-effort POST. Failures are reported to the bus
//! (which logs them) and the event is not retried.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::time::Duration;

use crate::domain::events::GatewayEvent;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::EventListener;

/// Header carrying `sha256=<hex hmac of body>` when a secret is configured.
pub const SIGNATURE_HEADER: &str = "X-Nexus-Signature";
pub const EVENT_HEADER: &str = "X-Nexus-Event";

#[derive(Debug, Clone)]
pub struct WebhookNotifierConfig {
    pub url: String,
    secret: Option<Secret<String>>,
    pub timeout: Duration,
}

impl WebhookNotifierConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secret: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_secret(mut self, secret: Secret<String>) -> Self {
        self.secret = Some(secret);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct WebhookNotifier {
    config: WebhookNotifierConfig,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(config: WebhookNotifierConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn signature(&self, body: &[u8]) -> Option<String> {
        let secret = self.config.secret.as_ref()?;
        Some(sign(secret.expose_secret(), body))
    }
}

/// `sha256=` followed by the hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("sha256={:x}", mac.finalize().into_bytes())
}

#[async_trait]
impl EventListener for WebhookNotifier {
    async fn handle(&self, event: GatewayEvent) -> Result<(), DomainError> {
        let body = serde_json::to_vec(&event).map_err(|e| {
            DomainError::new(ErrorCode::InternalError, format!("Failed to encode event: {}", e))
        })?;

        let mut request = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json")
            .header(EVENT_HEADER, event.kind.as_str());
        if let Some(signature) = self.signature(&body) {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.body(body).send().await.map_err(|e| {
            DomainError::new(ErrorCode::InternalError, format!("Webhook delivery failed: {}", e))
                .with_detail("event_id", event.event_id.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Webhook responded with {}", status),
            )
            .with_detail("event_id", event.event_id.to_string()));
        }

        tracing::debug!(event_id = %event.event_id, kind = %event.kind, "Webhook delivered");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "WebhookNotifier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_prefixed_hex_hmac() {
        // RFC 4231 test case 2
        let sig = sign("Jefe", b"what do ya want for nothing?");
        assert_eq!(
            sig,
            "sha256=5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn no_secret_means_no_signature() {
        let notifier = WebhookNotifier::new(WebhookNotifierConfig::new("http://localhost:1")).unwrap();
        assert!(notifier.signature(b"{}").is_none());
    }

    #[test]
    fn secret_produces_signature() {
        let config = WebhookNotifierConfig::new("http://localhost:1")
            .with_secret(Secret::new("s3cret".to_string()));
        let notifier = WebhookNotifier::new(config).unwrap();
        assert_eq!(notifier.signature(b"{}"), Some(sign("s3cret", b"{}")));
    }

    #[tokio::test]
    async fn unreachable_target_is_reported_as_error() {
        let config = WebhookNotifierConfig::new("http://127.0.0.1:9/hook")
            .with_timeout(Duration::from_millis(200));
        let notifier = WebhookNotifier::new(config).unwrap();
        let event = GatewayEvent::qr_update(
            crate::domain::foundation::InstanceKey::new("sales").unwrap(),
            "code",
        );

        assert!(notifier.handle(event).await.is_err());
    }
}
