//! Mirror reader port (read side).
//!
//! Read-only access to the contacts, groups and messages the engine mirrors
//! into the relational store for each instance.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::{DomainError, InstanceKey, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirroredChat {
    pub jid: String,
    pub name: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirroredMessage {
    pub id: i64,
    pub kind: String,
    pub content: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MirrorStats {
    pub contacts: i64,
    pub groups: i64,
    pub messages: i64,
}

#[async_trait]
pub trait MirrorReader: Send + Sync {
    /// Contacts ordered by name.
    async fn contacts(&self, instance: &InstanceKey) -> Result<Vec<MirroredChat>, DomainError>;

    /// Groups ordered by name.
    async fn groups(&self, instance: &InstanceKey) -> Result<Vec<MirroredChat>, DomainError>;

    /// Most recent messages of one chat, newest first.
    async fn messages(
        &self,
        instance: &InstanceKey,
        jid: &str,
        limit: i64,
    ) -> Result<Vec<MirroredMessage>, DomainError>;

    async fn stats(&self, instance: &InstanceKey) -> Result<MirrorStats, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_reader_is_object_safe() {
        fn _accepts_dyn(_reader: &dyn MirrorReader) {}
    }
}
