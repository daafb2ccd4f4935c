//! ListInstancesHandler - scoped view of registered and live instances.
//!
//! Super admins see everything, users only their allowed instances. The
//! registration table and the live registry are merged; storage failures
//! degrade to whatever the registry knows.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::application::SessionRegistry;
use crate::domain::access::Principal;
use crate::domain::foundation::{InstanceKey, PrincipalId, Timestamp};
use crate::domain::instance::ConnectionState;
use crate::ports::{InstanceRepository, MirrorReader, MirrorStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    pub name: InstanceKey,
    pub state: ConnectionState,
    pub registered: bool,
    pub owner: Option<PrincipalId>,
    pub created_at: Timestamp,
    pub messages_sent: u64,
    pub stats: MirrorStats,
}

pub struct ListInstancesHandler {
    registry: SessionRegistry,
    instances: Arc<dyn InstanceRepository>,
    mirror: Arc<dyn MirrorReader>,
}

impl ListInstancesHandler {
    pub fn new(
        registry: SessionRegistry,
        instances: Arc<dyn InstanceRepository>,
        mirror: Arc<dyn MirrorReader>,
    ) -> Self {
        Self {
            registry,
            instances,
            mirror,
        }
    }

    pub async fn handle(&self, principal: &Principal) -> Vec<InstanceSummary> {
        let stored = if principal.is_super_admin() {
            self.instances.list_all().await
        } else if principal.allowed_instances.is_empty() {
            Ok(Vec::new())
        } else {
            let names: Vec<String> = principal.allowed_instances.iter().cloned().collect();
            self.instances.list_named(&names).await
        };
        let stored = stored.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list registered instances");
            Vec::new()
        });

        let mut merged: BTreeMap<InstanceKey, InstanceSummary> = stored
            .into_iter()
            .map(|r| {
                let summary = InstanceSummary {
                    name: r.name.clone(),
                    state: ConnectionState::Disconnected,
                    registered: true,
                    owner: r.owner,
                    created_at: r.created_at,
                    messages_sent: 0,
                    stats: MirrorStats::default(),
                };
                (r.name, summary)
            })
            .collect();

        for info in self.registry.list().await {
            if !principal.can_access(&info.instance) {
                continue;
            }
            let entry = merged.entry(info.instance.clone()).or_insert_with(|| InstanceSummary {
                name: info.instance.clone(),
                state: info.state,
                registered: false,
                owner: info.owner,
                created_at: info.created_at,
                messages_sent: 0,
                stats: MirrorStats::default(),
            });
            entry.state = info.state;
            entry.messages_sent = info.messages_sent;
        }

        let mut summaries: Vec<_> = merged.into_values().collect();
        for summary in &mut summaries {
            summary.stats = self.mirror.stats(&summary.name).await.unwrap_or_else(|e| {
                warn!(instance = %summary.name, error = %e, "Failed to read mirror stats");
                MirrorStats::default()
            });
        }
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::engine::{ConnectScript, MockProtocolEngine};
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::{InMemoryInstanceRepository, InMemoryMirrorReader};
    use crate::application::SessionRegistryConfig;
    use crate::domain::access::{test_support::principal, PrincipalKind};

    fn key(s: &str) -> InstanceKey {
        InstanceKey::new(s).unwrap()
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(MockProtocolEngine::new().with_script("live", ConnectScript::Restored)),
            Arc::new(InMemoryEventBus::new()),
            SessionRegistryConfig::default(),
        )
    }

    async fn repo_with(names: &[&str]) -> Arc<InMemoryInstanceRepository> {
        let repo = Arc::new(InMemoryInstanceRepository::new());
        for name in names {
            repo.upsert(&key(name), None).await.unwrap();
        }
        repo
    }

    fn names(summaries: &[InstanceSummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.name.as_str()).collect()
    }

    #[tokio::test]
    async fn super_admin_sees_everything() {
        let handler = ListInstancesHandler::new(
            registry(),
            repo_with(&["sales", "support"]).await,
            Arc::new(InMemoryMirrorReader::new()),
        );

        let list = handler.handle(&principal(PrincipalKind::SuperAdmin, &[])).await;
        assert_eq!(names(&list), vec!["sales", "support"]);
    }

    #[tokio::test]
    async fn user_sees_only_allowed_instances() {
        let handler = ListInstancesHandler::new(
            registry(),
            repo_with(&["sales", "support"]).await,
            Arc::new(InMemoryMirrorReader::new()),
        );

        let list = handler.handle(&principal(PrincipalKind::User, &["sales"])).await;
        assert_eq!(names(&list), vec!["sales"]);

        let none = handler.handle(&principal(PrincipalKind::User, &[])).await;
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn live_state_and_stats_are_merged() {
        let registry = registry();
        registry.connect(&key("live"), None).await.unwrap();
        let mirror = Arc::new(InMemoryMirrorReader::new());
        mirror.add_contact(&key("live"), "1@s", "Ana");

        let handler = ListInstancesHandler::new(registry, repo_with(&["live"]).await, mirror);
        let list = handler.handle(&principal(PrincipalKind::SuperAdmin, &[])).await;

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].state, ConnectionState::Connected);
        assert!(list[0].registered);
        assert_eq!(list[0].stats.contacts, 1);
    }

    #[tokio::test]
    async fn storage_failure_degrades_to_live_instances() {
        let registry = registry();
        registry.connect(&key("live"), None).await.unwrap();
        let handler = ListInstancesHandler::new(
            registry,
            Arc::new(InMemoryInstanceRepository::failing()),
            Arc::new(InMemoryMirrorReader::failing()),
        );

        let list = handler.handle(&principal(PrincipalKind::SuperAdmin, &[])).await;
        assert_eq!(names(&list), vec!["live"]);
        assert!(!list[0].registered);
        assert_eq!(list[0].stats, MirrorStats::default());
    }
}
