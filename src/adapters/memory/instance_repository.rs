//! In-memory implementation of the InstanceRepository port.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::InMemoryMirrorReader;
use crate::domain::foundation::{DomainError, InstanceKey, PrincipalId, Timestamp};
use crate::ports::{InstanceRecord, InstanceRepository};

/// Registrations keyed by name. Deleting cascades into the attached mirror.
#[derive(Default)]
pub struct InMemoryInstanceRepository {
    rows: Mutex<BTreeMap<InstanceKey, InstanceRecord>>,
    mirror: Option<Arc<InMemoryMirrorReader>>,
    fail: bool,
}

impl InMemoryInstanceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deletes also purge this mirror.
    pub fn with_mirror(mirror: Arc<InMemoryMirrorReader>) -> Self {
        Self {
            mirror: Some(mirror),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.fail {
            return Err(DomainError::database("Simulated storage failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl InstanceRepository for InMemoryInstanceRepository {
    async fn upsert(
        &self,
        name: &InstanceKey,
        owner: Option<PrincipalId>,
    ) -> Result<InstanceRecord, DomainError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let record = rows.entry(name.clone()).or_insert_with(|| InstanceRecord {
            name: name.clone(),
            owner,
            created_at: Timestamp::now(),
        });
        if owner.is_some() {
            record.owner = owner;
        }
        Ok(record.clone())
    }

    async fn list_all(&self) -> Result<Vec<InstanceRecord>, DomainError> {
        self.check()?;
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn list_named(&self, names: &[String]) -> Result<Vec<InstanceRecord>, DomainError> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| names.iter().any(|n| n == r.name.as_str()))
            .cloned()
            .collect())
    }

    async fn delete_cascade(&self, name: &InstanceKey) -> Result<bool, DomainError> {
        self.check()?;
        let removed = self.rows.lock().unwrap().remove(name).is_some();
        if let Some(mirror) = &self.mirror {
            mirror.purge(name);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MirrorReader;

    fn key(s: &str) -> InstanceKey {
        InstanceKey::new(s).unwrap()
    }

    #[tokio::test]
    async fn upsert_keeps_original_creation_time() {
        let repo = InMemoryInstanceRepository::new();
        let first = repo.upsert(&key("sales"), None).await.unwrap();
        let second = repo
            .upsert(&key("sales"), Some(PrincipalId::new(3)))
            .await
            .unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.owner, Some(PrincipalId::new(3)));
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_named_filters_and_orders() {
        let repo = InMemoryInstanceRepository::new();
        for name in ["support", "sales", "ops"] {
            repo.upsert(&key(name), None).await.unwrap();
        }

        let names: Vec<_> = repo
            .list_named(&["support".into(), "ops".into()])
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name.to_string())
            .collect();
        assert_eq!(names, vec!["ops", "support"]);
        assert!(repo.list_named(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_into_mirror() {
        let mirror = Arc::new(InMemoryMirrorReader::new());
        mirror.add_contact(&key("sales"), "1@s", "Ana");
        let repo = InMemoryInstanceRepository::with_mirror(mirror.clone());
        repo.upsert(&key("sales"), None).await.unwrap();

        assert!(repo.delete_cascade(&key("sales")).await.unwrap());
        assert!(!repo.delete_cascade(&key("sales")).await.unwrap());
        assert!(mirror.contacts(&key("sales")).await.unwrap().is_empty());
    }
}
