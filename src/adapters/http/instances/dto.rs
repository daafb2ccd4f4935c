//! Data Transfer Objects for instance lifecycle and mirror endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::InstanceSummary;
use crate::domain::directory::Contact;
use crate::domain::foundation::Timestamp;
use crate::domain::instance::{ConnectOutcome, ConnectionState, InstanceInfo};
use crate::ports::{InstanceRecord, MirrorStats, MirroredChat, MirroredMessage};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInstanceRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairRequest {
    pub phone: String,
}

/// Missing fields are left to domain validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateGroupRequest {
    pub subject: String,
    pub participants: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupParticipantsRequest {
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupActionQuery {
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSearchQuery {
    #[serde(default)]
    pub q: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Result of `POST /v1/instance/:key/connect`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qrcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<ConnectOutcome> for ConnectResponse {
    fn from(outcome: ConnectOutcome) -> Self {
        let status = outcome.status();
        match outcome {
            ConnectOutcome::AlreadyConnected => Self {
                status,
                qrcode: None,
                message: Some("Already connected".into()),
            },
            ConnectOutcome::SessionRestored => Self {
                status,
                qrcode: None,
                message: Some("Session restored from stored credentials".into()),
            },
            ConnectOutcome::QrCode(code) => Self {
                status,
                qrcode: Some(code),
                message: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub status: &'static str,
    pub was_registered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairResponse {
    pub status: &'static str,
    pub code: String,
}

/// Bare `{"status": ...}` acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupResponse {
    pub status: &'static str,
    pub group_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub jid: String,
    pub name: String,
    pub is_group: bool,
}

impl From<Contact> for ContactResponse {
    fn from(c: Contact) -> Self {
        Self {
            jid: c.jid,
            name: c.name,
            is_group: c.is_group,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactSearchResponse {
    pub contacts: Vec<ContactResponse>,
    pub total: usize,
}

impl From<Vec<Contact>> for ContactSearchResponse {
    fn from(contacts: Vec<Contact>) -> Self {
        let contacts: Vec<ContactResponse> =
            contacts.into_iter().map(ContactResponse::from).collect();
        Self {
            total: contacts.len(),
            contacts,
        }
    }
}

/// Connection state plus mirror counts for one instance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfoResponse {
    pub instance: String,
    pub state: ConnectionState,
    pub created_at: Timestamp,
    pub owner: Option<i64>,
    pub messages_sent: u64,
    pub stats: MirrorStats,
}

impl InstanceInfoResponse {
    pub fn new(info: InstanceInfo, stats: MirrorStats) -> Self {
        Self {
            instance: info.instance.to_string(),
            state: info.state,
            created_at: info.created_at,
            owner: info.owner.map(|o| o.as_i64()),
            messages_sent: info.messages_sent,
            stats,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecordResponse {
    pub name: String,
    pub created_by: Option<i64>,
    pub created_at: Timestamp,
}

impl From<InstanceRecord> for InstanceRecordResponse {
    fn from(r: InstanceRecord) -> Self {
        Self {
            name: r.name.to_string(),
            created_by: r.owner.map(|o| o.as_i64()),
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSummaryResponse {
    pub name: String,
    pub state: ConnectionState,
    pub registered: bool,
    pub owner: Option<i64>,
    pub created_at: Timestamp,
    pub messages_sent: u64,
    pub stats: MirrorStats,
}

impl From<InstanceSummary> for InstanceSummaryResponse {
    fn from(s: InstanceSummary) -> Self {
        Self {
            name: s.name.to_string(),
            state: s.state,
            registered: s.registered,
            owner: s.owner.map(|o| o.as_i64()),
            created_at: s.created_at,
            messages_sent: s.messages_sent,
            stats: s.stats,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceListResponse {
    pub instances: Vec<InstanceSummaryResponse>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub jid: String,
    pub name: String,
    pub created_at: Timestamp,
}

impl From<MirroredChat> for ChatResponse {
    fn from(c: MirroredChat) -> Self {
        Self {
            jid: c.jid,
            name: c.name,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatListResponse {
    pub chats: Vec<ChatResponse>,
    pub total: usize,
}

impl From<Vec<MirroredChat>> for ChatListResponse {
    fn from(chats: Vec<MirroredChat>) -> Self {
        let chats: Vec<ChatResponse> = chats.into_iter().map(ChatResponse::from).collect();
        Self {
            total: chats.len(),
            chats,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub created_at: Timestamp,
}

impl From<MirroredMessage> for MessageResponse {
    fn from(m: MirroredMessage) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageResponse>,
    pub total: usize,
}

impl From<Vec<MirroredMessage>> for MessageListResponse {
    fn from(messages: Vec<MirroredMessage>) -> Self {
        let messages: Vec<MessageResponse> =
            messages.into_iter().map(MessageResponse::from).collect();
        Self {
            total: messages.len(),
            messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_outcome_carries_code_without_message() {
        let json = serde_json::to_value(ConnectResponse::from(ConnectOutcome::QrCode(
            "2@abc".into(),
        )))
        .unwrap();
        assert_eq!(json["status"], "qrcode");
        assert_eq!(json["qrcode"], "2@abc");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn already_connected_has_message_and_no_code() {
        let json =
            serde_json::to_value(ConnectResponse::from(ConnectOutcome::AlreadyConnected)).unwrap();
        assert_eq!(json["status"], "already_connected");
        assert!(json.get("qrcode").is_none());
        assert_eq!(json["message"], "Already connected");
    }

    #[test]
    fn message_kind_is_serialized_as_type() {
        let json = serde_json::to_value(MessageResponse::from(MirroredMessage {
            id: 1,
            kind: "text".into(),
            content: "hi".into(),
            created_at: Timestamp::now(),
        }))
        .unwrap();
        assert_eq!(json["type"], "text");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn create_group_request_tolerates_missing_fields() {
        let req: CreateGroupRequest = serde_json::from_str(r#"{"subject":"Sales"}"#).unwrap();
        assert_eq!(req.subject, "Sales");
        assert!(req.participants.is_empty());
        assert!(req.description.is_none());
    }

    #[test]
    fn contact_search_uses_camel_case() {
        let json = serde_json::to_value(ContactSearchResponse::from(vec![Contact {
            jid: "1@g.us".into(),
            name: "Team".into(),
            is_group: true,
        }]))
        .unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["contacts"][0]["isGroup"], true);
    }

    #[test]
    fn pair_request_reads_phone() {
        let req: PairRequest = serde_json::from_str(r#"{"phone":"5511999990000"}"#).unwrap();
        assert_eq!(req.phone, "5511999990000");
    }
}
