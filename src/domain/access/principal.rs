//! API-key principals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::Validity;
use crate::domain::foundation::{InstanceKey, PrincipalId, Timestamp, ValidationError};

/// Privilege level attached to an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    User,
    SuperAdmin,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::SuperAdmin => "super_admin",
        }
    }

    /// Leading scheme of raw keys issued for this kind.
    pub fn key_scheme(&self) -> &'static str {
        match self {
            PrincipalKind::User => "nxus_",
            PrincipalKind::SuperAdmin => "nxsa_",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrincipalKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(PrincipalKind::User),
            "super_admin" => Ok(PrincipalKind::SuperAdmin),
            other => Err(ValidationError::invalid_format(
                "kind",
                format!("unknown principal kind '{}'", other),
            )),
        }
    }
}

/// Stored identity behind an API key. Never carries the raw key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: PrincipalId,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub key_prefix: String,
    pub name: String,
    pub kind: PrincipalKind,
    pub active: bool,
    pub allowed_instances: BTreeSet<String>,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub last_used_at: Option<Timestamp>,
    pub request_count: i64,
}

impl Principal {
    pub fn is_super_admin(&self) -> bool {
        self.kind == PrincipalKind::SuperAdmin
    }

    /// True once `expires_at` lies in the past. Keys without expiry never expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|t| t.is_past()).unwrap_or(false)
    }

    /// Super admins may act on any instance; users only on their allowed set.
    pub fn can_access(&self, instance: &InstanceKey) -> bool {
        self.is_super_admin() || self.allowed_instances.contains(instance.as_str())
    }
}

/// Data needed to insert a new principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrincipal {
    pub key_hash: String,
    pub key_prefix: String,
    pub name: String,
    pub kind: PrincipalKind,
    pub allowed_instances: BTreeSet<String>,
    pub expires_at: Option<Timestamp>,
}

impl NewPrincipal {
    pub const MAX_NAME_LENGTH: usize = 100;

    pub fn validate_name(name: &str) -> Result<String, ValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if trimmed.len() > Self::MAX_NAME_LENGTH {
            return Err(ValidationError::too_long(
                "name",
                Self::MAX_NAME_LENGTH,
                trimmed.len(),
            ));
        }
        Ok(trimmed.to_string())
    }
}

/// Partial update applied by administrators. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub kind: Option<PrincipalKind>,
    pub allowed_instances: Option<BTreeSet<String>>,
    pub renew_validity: Option<Validity>,
}

impl PrincipalUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.active.is_none()
            && self.kind.is_none()
            && self.allowed_instances.is_none()
            && self.renew_validity.is_none()
    }

    /// Applies the update in memory. `now` anchors a validity renewal.
    pub fn apply_to(&self, principal: &mut Principal, now: Timestamp) {
        if let Some(name) = &self.name {
            principal.name = name.clone();
        }
        if let Some(active) = self.active {
            principal.active = active;
        }
        if let Some(kind) = self.kind {
            principal.kind = kind;
        }
        if let Some(allowed) = &self.allowed_instances {
            principal.allowed_instances = allowed.clone();
        }
        if let Some(validity) = self.renew_validity {
            principal.expires_at = Some(validity.expires_at(now));
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn principal(kind: PrincipalKind, allowed: &[&str]) -> Principal {
        Principal {
            id: PrincipalId::new(1),
            key_hash: "hash".to_string(),
            key_prefix: "nxus_abc".to_string(),
            name: "ops".to_string(),
            kind,
            active: true,
            allowed_instances: allowed.iter().map(|s| s.to_string()).collect(),
            created_at: Timestamp::now(),
            expires_at: None,
            last_used_at: None,
            request_count: 0,
        }
    }
}
