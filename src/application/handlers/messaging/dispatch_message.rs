//! MessageDispatcher - resolves a generic send request and hands it to the
//! live session of an instance.
//!
//! Immediate sends await the engine. Sends with `delay > 0` are scheduled on a
//! timer task and return at once; the connection is checked again when the
//! timer fires and the outcome is only logged.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::SessionRegistry;
use crate::domain::foundation::{DeliveryId, InstanceKey};
use crate::domain::messaging::{
    DeliveryOptions, DispatchError, DispatchOutcome, MessageKind, OutboundMessage, SendMessageRequest,
};

/// Command to send one message through an instance.
#[derive(Debug, Clone)]
pub struct DispatchMessageCommand {
    pub instance: InstanceKey,
    /// Type tag from the route.
    pub kind: String,
    pub request: SendMessageRequest,
}

#[derive(Clone)]
pub struct MessageDispatcher {
    registry: SessionRegistry,
    shutdown: CancellationToken,
}

impl MessageDispatcher {
    pub fn new(registry: SessionRegistry) -> Self {
        Self {
            registry,
            shutdown: CancellationToken::new(),
        }
    }

    /// Validates, resolves and sends (or schedules) a message.
    ///
    /// Checks run in order: type tag, payload, connection. The engine is never
    /// called when any of them fails.
    pub async fn handle(&self, cmd: DispatchMessageCommand) -> Result<DispatchOutcome, DispatchError> {
        let kind: MessageKind = cmd.kind.parse()?;
        if let Some(declared) = cmd.request.kind.as_deref() {
            if declared != kind.as_str() {
                return Err(DispatchError::invalid_payload(format!(
                    "type '{}' does not match route kind '{}'",
                    declared, kind
                )));
            }
        }
        let message = OutboundMessage::resolve(kind, &cmd.request)?;

        if !self.registry.is_connected(&cmd.instance).await {
            return Err(DispatchError::NotConnected(cmd.instance));
        }

        let to = cmd.request.number.trim().to_string();
        let delay = cmd.request.options.delay;

        if delay > 0 {
            let delivery_id = DeliveryId::new();
            self.schedule(delivery_id, cmd.instance, to, message, cmd.request.options);
            return Ok(DispatchOutcome::Scheduled {
                delivery_id,
                delay_secs: delay,
            });
        }

        let id = self
            .registry
            .send(&cmd.instance, &to, &message, &cmd.request.options)
            .await?;
        debug!(instance = %cmd.instance, kind = %kind, message_id = %id, "Message sent");
        Ok(DispatchOutcome::Sent(id))
    }

    /// Drops every delivery that has not fired yet.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn schedule(
        &self,
        delivery_id: DeliveryId,
        instance: InstanceKey,
        to: String,
        message: OutboundMessage,
        options: DeliveryOptions,
    ) {
        let registry = self.registry.clone();
        let shutdown = self.shutdown.clone();
        let delay = Duration::from_secs(options.delay);
        let options = DeliveryOptions { delay: 0, ..options };

        info!(%delivery_id, %instance, delay_secs = delay.as_secs(), "Scheduled delayed message");

        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    warn!(%delivery_id, %instance, "Delayed message dropped on shutdown");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            match registry.send(&instance, &to, &message, &options).await {
                Ok(id) => info!(%delivery_id, %instance, message_id = %id, "Delayed message sent"),
                Err(e) => warn!(%delivery_id, %instance, error = %e, code = e.code(), "Delayed message failed"),
            }
        });
    }
}
