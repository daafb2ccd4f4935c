//! In-memory event publisher for testing.
//!
//! Captures every published event so tests can assert on what the session
//! registry and dispatcher emitted. Nothing is delivered to listeners.

use std::sync::RwLock;

use crate::domain::events::{EventKind, GatewayEvent};
use crate::domain::foundation::InstanceKey;
use crate::ports::EventPublisher;

/// Event publisher that records instead of delivering.
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// registry.connect(&key, None).await?;
/// assert!(bus.has_event(EventKind::QrUpdate));
/// ```
#[derive(Default)]
pub struct InMemoryEventBus {
    published: RwLock<Vec<GatewayEvent>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all published events in publish order.
    pub fn published_events(&self) -> Vec<GatewayEvent> {
        match self.published.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn events_of_kind(&self, kind: EventKind) -> Vec<GatewayEvent> {
        self.published_events()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }

    pub fn events_for_instance(&self, instance: &InstanceKey) -> Vec<GatewayEvent> {
        self.published_events()
            .into_iter()
            .filter(|e| &e.instance == instance)
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.published_events().len()
    }

    pub fn has_event(&self, kind: EventKind) -> bool {
        self.published_events().iter().any(|e| e.kind == kind)
    }

    /// Clears all published events (for test isolation).
    pub fn clear(&self) {
        match self.published.write() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: GatewayEvent) {
        match self.published.write() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instance::ConnectionState;

    fn key() -> InstanceKey {
        InstanceKey::new("sales").unwrap()
    }

    #[test]
    fn records_events_in_order() {
        let bus = InMemoryEventBus::new();
        bus.publish(GatewayEvent::qr_update(key(), "a"));
        bus.publish(GatewayEvent::connection_update(key(), ConnectionState::Connected, None));

        let kinds: Vec<_> = bus.published_events().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::QrUpdate, EventKind::ConnectionUpdate]);
    }

    #[test]
    fn filters_by_kind_and_instance() {
        let bus = InMemoryEventBus::new();
        bus.publish(GatewayEvent::qr_update(key(), "a"));
        bus.publish(GatewayEvent::qr_update(InstanceKey::new("other").unwrap(), "b"));

        assert_eq!(bus.events_of_kind(EventKind::QrUpdate).len(), 2);
        assert_eq!(bus.events_for_instance(&key()).len(), 1);
        assert!(!bus.has_event(EventKind::MessageReceived));
    }

    #[test]
    fn clear_resets() {
        let bus = InMemoryEventBus::new();
        bus.publish(GatewayEvent::qr_update(key(), "a"));
        bus.clear();
        assert_eq!(bus.event_count(), 0);
    }
}
