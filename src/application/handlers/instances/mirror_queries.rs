//! Read-only queries over mirrored contacts, groups and messages.
//!
//! Every query degrades to an empty result when the store fails.

use std::sync::Arc;

use tracing::warn;

use crate::domain::foundation::InstanceKey;
use crate::ports::{MirrorReader, MirrorStats, MirroredChat, MirroredMessage};

/// Messages returned per chat, newest first.
pub const MESSAGE_HISTORY_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct MirrorQueries {
    reader: Arc<dyn MirrorReader>,
}

impl MirrorQueries {
    pub fn new(reader: Arc<dyn MirrorReader>) -> Self {
        Self { reader }
    }

    pub async fn contacts(&self, instance: &InstanceKey) -> Vec<MirroredChat> {
        self.reader.contacts(instance).await.unwrap_or_else(|e| {
            warn!(%instance, error = %e, "Failed to read contacts");
            Vec::new()
        })
    }

    pub async fn groups(&self, instance: &InstanceKey) -> Vec<MirroredChat> {
        self.reader.groups(instance).await.unwrap_or_else(|e| {
            warn!(%instance, error = %e, "Failed to read groups");
            Vec::new()
        })
    }

    pub async fn messages(&self, instance: &InstanceKey, jid: &str) -> Vec<MirroredMessage> {
        self.reader
            .messages(instance, jid, MESSAGE_HISTORY_LIMIT)
            .await
            .unwrap_or_else(|e| {
                warn!(%instance, jid, error = %e, "Failed to read messages");
                Vec::new()
            })
    }

    pub async fn stats(&self, instance: &InstanceKey) -> MirrorStats {
        self.reader.stats(instance).await.unwrap_or_else(|e| {
            warn!(%instance, error = %e, "Failed to read mirror stats");
            MirrorStats::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMirrorReader;

    fn key() -> InstanceKey {
        InstanceKey::new("sales").unwrap()
    }

    #[tokio::test]
    async fn message_history_is_capped() {
        let mirror = Arc::new(InMemoryMirrorReader::new());
        for i in 0..120 {
            mirror.add_message(&key(), "1@s", "text", &format!("m{}", i));
        }
        let queries = MirrorQueries::new(mirror);

        let messages = queries.messages(&key(), "1@s").await;
        assert_eq!(messages.len(), MESSAGE_HISTORY_LIMIT as usize);
        assert_eq!(messages[0].content, "m119");
    }

    #[tokio::test]
    async fn failures_degrade_to_empty() {
        let queries = MirrorQueries::new(Arc::new(InMemoryMirrorReader::failing()));

        assert!(queries.contacts(&key()).await.is_empty());
        assert!(queries.groups(&key()).await.is_empty());
        assert!(queries.messages(&key(), "1@s").await.is_empty());
        assert_eq!(queries.stats(&key()).await, MirrorStats::default());
    }
}
