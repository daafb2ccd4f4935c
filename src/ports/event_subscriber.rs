//! EventSubscriber port - Interface for subscribing to gateway events.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::events::GatewayEvent;
use crate::domain::foundation::DomainError;

/// Listener that processes events delivered by the bus.
///
/// Each listener is driven by its own task, so a listener that is slow,
/// returns an error or panics only affects itself.
///
/// ```ignore
/// #[async_trait]
/// impl EventListener for WebhookNotifier {
///     async fn handle(&self, event: GatewayEvent) -> Result<(), DomainError> {
///         self.post(&event).await
///     }
///
///     fn name(&self) -> &'static str {
///         "WebhookNotifier"
///     }
/// }
/// ```
#[async_trait]
pub trait EventListener: Send + Sync {
    /// Process an event.
    async fn handle(&self, event: GatewayEvent) -> Result<(), DomainError>;

    /// Listener name for logging.
    fn name(&self) -> &'static str;
}

/// Identifier of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned by [`EventSubscriber::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub listener: &'static str,
}

/// Port for registering and removing listeners.
pub trait EventSubscriber: Send + Sync {
    /// Register a listener for every event published from now on.
    fn subscribe(&self, listener: Arc<dyn EventListener>) -> Subscription;

    /// Remove a listener. Returns false if the id is unknown.
    ///
    /// Events already queued for the listener are still delivered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Combined trait for event bus implementations.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_listener_object_safe(_: &dyn EventListener) {}

    #[allow(dead_code)]
    fn assert_subscriber_object_safe(_: &dyn EventSubscriber) {}

    #[test]
    fn subscription_ids_are_unique() {
        assert_ne!(SubscriptionId::new(), SubscriptionId::new());
    }
}
