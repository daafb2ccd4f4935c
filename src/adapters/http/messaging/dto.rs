//! Data Transfer Objects for the send endpoint.
//!
//! The request body is the domain `SendMessageRequest` envelope itself.

use serde::Serialize;

use crate::domain::messaging::DispatchOutcome;

/// Result of `POST /v1/message/:instance/:kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SendMessageResponse {
    #[serde(rename_all = "camelCase")]
    Sent { message_id: String },
    #[serde(rename_all = "camelCase")]
    Scheduled { delivery_id: String, delay_secs: u64 },
}

impl From<DispatchOutcome> for SendMessageResponse {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Sent(id) => SendMessageResponse::Sent {
                message_id: id.to_string(),
            },
            DispatchOutcome::Scheduled {
                delivery_id,
                delay_secs,
            } => SendMessageResponse::Scheduled {
                delivery_id: delivery_id.to_string(),
                delay_secs,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DeliveryId, MessageId};

    #[test]
    fn sent_outcome_serializes_message_id() {
        let json = serde_json::to_value(SendMessageResponse::from(DispatchOutcome::Sent(
            MessageId::new("3EB0ABC"),
        )))
        .unwrap();
        assert_eq!(json["status"], "sent");
        assert_eq!(json["messageId"], "3EB0ABC");
    }

    #[test]
    fn scheduled_outcome_serializes_delivery() {
        let json = serde_json::to_value(SendMessageResponse::from(DispatchOutcome::Scheduled {
            delivery_id: DeliveryId::new(),
            delay_secs: 5,
        }))
        .unwrap();
        assert_eq!(json["status"], "scheduled");
        assert_eq!(json["delaySecs"], 5);
        assert!(json["deliveryId"].is_string());
    }
}
