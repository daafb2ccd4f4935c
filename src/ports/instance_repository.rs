//! Instance registration port.
//!
//! Registered instances are the durable list of names an operator created.
//! The live connection state lives in the session registry, not here.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::{DomainError, InstanceKey, PrincipalId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceRecord {
    pub name: InstanceKey,
    pub owner: Option<PrincipalId>,
    pub created_at: Timestamp,
}

#[async_trait]
pub trait InstanceRepository: Send + Sync {
    /// Insert or refresh a registration. Existing rows keep `created_at`.
    async fn upsert(
        &self,
        name: &InstanceKey,
        owner: Option<PrincipalId>,
    ) -> Result<InstanceRecord, DomainError>;

    /// All registrations ordered by name.
    async fn list_all(&self) -> Result<Vec<InstanceRecord>, DomainError>;

    /// Registrations whose name is in `names`, ordered by name.
    async fn list_named(&self, names: &[String]) -> Result<Vec<InstanceRecord>, DomainError>;

    /// Delete a registration together with its mirrored contacts, groups and
    /// messages. Returns false if nothing was registered under that name.
    async fn delete_cascade(&self, name: &InstanceKey) -> Result<bool, DomainError>;
}
