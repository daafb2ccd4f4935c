//! In-memory implementation of the ApiKeyRepository port.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::domain::access::{NewPrincipal, Principal};
use crate::domain::foundation::{DomainError, ErrorCode, PrincipalId, Timestamp};
use crate::ports::ApiKeyRepository;

#[derive(Default)]
struct Store {
    next_id: i64,
    rows: BTreeMap<PrincipalId, Principal>,
}

/// API keys held in a map keyed by id.
///
/// ```ignore
/// let repo = InMemoryApiKeyRepository::new();
/// let principal = repo.insert(new_principal).await?;
/// assert!(repo.find_by_hash(&principal.key_hash).await?.is_some());
/// ```
#[derive(Default)]
pub struct InMemoryApiKeyRepository {
    store: Mutex<Store>,
    fail: bool,
}

impl InMemoryApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository whose every call fails with `DatabaseError`.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.store.lock().unwrap().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.fail {
            return Err(DomainError::database("Simulated storage failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<Principal>, DomainError> {
        self.check()?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .rows
            .values()
            .find(|p| p.key_hash == key_hash)
            .cloned())
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>, DomainError> {
        self.check()?;
        Ok(self.store.lock().unwrap().rows.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Principal>, DomainError> {
        self.check()?;
        let mut all: Vec<_> = self.store.lock().unwrap().rows.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }

    async fn insert(&self, new: NewPrincipal) -> Result<Principal, DomainError> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        if store.rows.values().any(|p| p.key_hash == new.key_hash) {
            return Err(DomainError::new(ErrorCode::ValidationFailed, "key hash already exists"));
        }
        store.next_id += 1;
        let principal = Principal {
            id: PrincipalId::new(store.next_id),
            key_hash: new.key_hash,
            key_prefix: new.key_prefix,
            name: new.name,
            kind: new.kind,
            active: true,
            allowed_instances: new.allowed_instances,
            created_at: Timestamp::now(),
            expires_at: new.expires_at,
            last_used_at: None,
            request_count: 0,
        };
        store.rows.insert(principal.id, principal.clone());
        Ok(principal)
    }

    async fn update(&self, principal: &Principal) -> Result<(), DomainError> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        match store.rows.get_mut(&principal.id) {
            Some(row) => {
                row.name = principal.name.clone();
                row.active = principal.active;
                row.kind = principal.kind;
                row.allowed_instances = principal.allowed_instances.clone();
                row.expires_at = principal.expires_at;
                Ok(())
            }
            None => Err(DomainError::new(ErrorCode::ApiKeyNotFound, "API key not found")),
        }
    }

    async fn delete(&self, id: PrincipalId) -> Result<bool, DomainError> {
        self.check()?;
        Ok(self.store.lock().unwrap().rows.remove(&id).is_some())
    }

    async fn record_usage(&self, id: PrincipalId, at: Timestamp) -> Result<(), DomainError> {
        self.check()?;
        if let Some(row) = self.store.lock().unwrap().rows.get_mut(&id) {
            row.last_used_at = Some(at);
            row.request_count += 1;
        }
        Ok(())
    }
}
