use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::domain::foundation::{EventId, InstanceKey, Timestamp};
use crate::domain::instance::ConnectionState;

/// Discriminator for [`GatewayEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "connection.update")]
    ConnectionUpdate,
    #[serde(rename = "qr.update")]
    QrUpdate,
    #[serde(rename = "message.received")]
    MessageReceived,
    #[serde(rename = "message.receipt")]
    MessageReceipt,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ConnectionUpdate => "connection.update",
            EventKind::QrUpdate => "qr.update",
            EventKind::MessageReceived => "message.received",
            EventKind::MessageReceipt => "message.receipt",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event published on the bus. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub event_id: EventId,
    pub instance: InstanceKey,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: Timestamp,
    pub payload: Value,
}

impl GatewayEvent {
    pub fn new(instance: InstanceKey, kind: EventKind, payload: Value) -> Self {
        Self {
            event_id: EventId::new(),
            instance,
            kind,
            timestamp: Timestamp::now(),
            payload,
        }
    }

    pub fn connection_update(
        instance: InstanceKey,
        state: ConnectionState,
        reason: Option<&str>,
    ) -> Self {
        let mut payload = json!({ "state": state });
        if let Some(reason) = reason {
            payload["reason"] = Value::String(reason.to_string());
        }
        Self::new(instance, EventKind::ConnectionUpdate, payload)
    }

    pub fn qr_update(instance: InstanceKey, code: &str) -> Self {
        Self::new(instance, EventKind::QrUpdate, json!({ "qrcode": code }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_dotted_type() {
        let event = GatewayEvent::qr_update(InstanceKey::new("sales").unwrap(), "2@abc");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "qr.update");
        assert_eq!(json["instance"], "sales");
        assert_eq!(json["payload"]["qrcode"], "2@abc");
    }

    #[test]
    fn connection_update_carries_state_and_reason() {
        let event = GatewayEvent::connection_update(
            InstanceKey::new("sales").unwrap(),
            ConnectionState::Disconnected,
            Some("stream error"),
        );

        assert_eq!(event.kind, EventKind::ConnectionUpdate);
        assert_eq!(event.payload["state"], "disconnected");
        assert_eq!(event.payload["reason"], "stream error");
    }

    #[test]
    fn each_event_gets_its_own_id() {
        let key = InstanceKey::new("sales").unwrap();
        let a = GatewayEvent::qr_update(key.clone(), "a");
        let b = GatewayEvent::qr_update(key, "a");
        assert_ne!(a.event_id, b.event_id);
    }
}
