//! Data Transfer Objects for API-key endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::ApiKeyView;
use crate::domain::access::{Principal, PrincipalKind};
use crate::domain::foundation::Timestamp;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Validity selector as sent by clients; both `30` and `"30"` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ValidityInput {
    Days(u32),
    Text(String),
}

impl ValidityInput {
    pub fn into_selector(self) -> String {
        match self {
            ValidityInput::Days(d) => d.to_string(),
            ValidityInput::Text(s) => s,
        }
    }
}

/// Request to issue a new API key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueApiKeyRequest {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: PrincipalKind,
    #[serde(default)]
    pub allowed_instances: Vec<String>,
    #[serde(default)]
    pub validity: Option<ValidityInput>,
}

fn default_kind() -> PrincipalKind {
    PrincipalKind::User
}

/// Partial update of an API key. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiKeyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub kind: Option<PrincipalKind>,
    #[serde(default)]
    pub allowed_instances: Option<Vec<String>>,
    #[serde(default)]
    pub renew_validity: Option<ValidityInput>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Public view of a principal. Never carries the key hash or raw key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalResponse {
    pub id: i64,
    pub name: String,
    pub kind: PrincipalKind,
    pub key_prefix: String,
    pub active: bool,
    pub expired: bool,
    pub allowed_instances: Vec<String>,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub last_used_at: Option<Timestamp>,
    pub request_count: i64,
}

impl From<Principal> for PrincipalResponse {
    fn from(p: Principal) -> Self {
        Self {
            expired: p.is_expired(),
            id: p.id.as_i64(),
            name: p.name,
            kind: p.kind,
            key_prefix: p.key_prefix,
            active: p.active,
            allowed_instances: p.allowed_instances.into_iter().collect(),
            created_at: p.created_at,
            expires_at: p.expires_at,
            last_used_at: p.last_used_at,
            request_count: p.request_count,
        }
    }
}

impl From<ApiKeyView> for PrincipalResponse {
    fn from(view: ApiKeyView) -> Self {
        let expired = view.expired;
        Self {
            expired,
            ..view.principal.into()
        }
    }
}

/// Response to key issuance; the only place a raw key ever appears.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueApiKeyResponse {
    pub api_key: String,
    pub key: PrincipalResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyListResponse {
    pub keys: Vec<PrincipalResponse>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PrincipalId;
    use std::collections::BTreeSet;

    fn principal() -> Principal {
        Principal {
            id: PrincipalId::new(7),
            key_hash: "secret-hash".into(),
            key_prefix: "nxus_1a2".into(),
            name: "ops".into(),
            kind: PrincipalKind::User,
            active: true,
            allowed_instances: BTreeSet::from(["sales".to_string()]),
            created_at: Timestamp::now(),
            expires_at: Some(Timestamp::now().add_days(-1)),
            last_used_at: None,
            request_count: 3,
        }
    }

    #[test]
    fn issue_request_defaults_to_user_without_expiry() {
        let req: IssueApiKeyRequest = serde_json::from_str(r#"{"name":"ops"}"#).unwrap();
        assert_eq!(req.kind, PrincipalKind::User);
        assert!(req.allowed_instances.is_empty());
        assert!(req.validity.is_none());
    }

    #[test]
    fn validity_accepts_number_or_string() {
        let req: IssueApiKeyRequest =
            serde_json::from_str(r#"{"name":"ops","validity":30}"#).unwrap();
        assert_eq!(req.validity.unwrap().into_selector(), "30");

        let req: IssueApiKeyRequest =
            serde_json::from_str(r#"{"name":"ops","kind":"super_admin","validity":"90"}"#)
                .unwrap();
        assert_eq!(req.kind, PrincipalKind::SuperAdmin);
        assert_eq!(req.validity.unwrap().into_selector(), "90");
    }

    #[test]
    fn update_request_reads_camel_case() {
        let req: UpdateApiKeyRequest = serde_json::from_str(
            r#"{"allowedInstances":["a","b"],"renewValidity":"365","active":false}"#,
        )
        .unwrap();
        assert_eq!(req.allowed_instances.unwrap().len(), 2);
        assert_eq!(req.active, Some(false));
        assert!(req.name.is_none());
    }

    #[test]
    fn principal_response_hides_hash_and_flags_expiry() {
        let json = serde_json::to_value(PrincipalResponse::from(principal())).unwrap();
        assert_eq!(json["keyPrefix"], "nxus_1a2");
        assert_eq!(json["expired"], true);
        assert_eq!(json["allowedInstances"][0], "sales");
        assert!(json.get("keyHash").is_none());
        assert!(json.get("key_hash").is_none());
    }
}
