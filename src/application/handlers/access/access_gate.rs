//! AccessGate - resolves a presented API key to a principal and checks scope.
//!
//! Validation is a single hash lookup. Usage statistics are recorded on a
//! spawned task so a slow or failing store never delays the request.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::access::{hash_key, AuthError, AuthzError, Principal};
use crate::domain::foundation::{InstanceKey, Timestamp};
use crate::ports::ApiKeyRepository;

#[derive(Clone)]
pub struct AccessGate {
    keys: Arc<dyn ApiKeyRepository>,
}

impl AccessGate {
    pub fn new(keys: Arc<dyn ApiKeyRepository>) -> Self {
        Self { keys }
    }

    /// Authenticates a raw credential.
    ///
    /// The credential is hashed exactly as presented; surrounding whitespace
    /// makes it a different key.
    pub async fn validate(&self, credential: Option<&str>) -> Result<Principal, AuthError> {
        let raw = match credential {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Err(AuthError::MissingKey),
        };

        let principal = self
            .keys
            .find_by_hash(&hash_key(raw))
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?
            .ok_or(AuthError::InvalidKey)?;

        if !principal.active {
            debug!(principal_id = %principal.id, "Rejected inactive API key");
            return Err(AuthError::InactiveKey);
        }
        if principal.is_expired() {
            debug!(principal_id = %principal.id, "Rejected expired API key");
            return Err(AuthError::ExpiredKey);
        }

        let keys = self.keys.clone();
        let id = principal.id;
        tokio::spawn(async move {
            if let Err(e) = keys.record_usage(id, Timestamp::now()).await {
                warn!(principal_id = %id, error = %e, "Failed to record API key usage");
            }
        });

        Ok(principal)
    }

    pub fn authorize(principal: &Principal, instance: &InstanceKey) -> Result<(), AuthzError> {
        if principal.can_access(instance) {
            Ok(())
        } else {
            Err(AuthzError::InstanceForbidden(instance.clone()))
        }
    }

    pub fn require_super_admin(principal: &Principal) -> Result<(), AuthzError> {
        if principal.is_super_admin() {
            Ok(())
        } else {
            Err(AuthzError::SuperAdminRequired)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryApiKeyRepository;
    use crate::domain::access::{test_support::principal, GeneratedKey, NewPrincipal, PrincipalKind};
    use std::time::Duration;

    async fn seeded(kind: PrincipalKind) -> (Arc<InMemoryApiKeyRepository>, GeneratedKey, Principal) {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let key = GeneratedKey::generate(kind);
        let principal = repo
            .insert(NewPrincipal {
                key_hash: key.hash.clone(),
                key_prefix: key.prefix.clone(),
                name: "ops".to_string(),
                kind,
                allowed_instances: ["sales".to_string()].into_iter().collect(),
                expires_at: None,
            })
            .await
            .unwrap();
        (repo, key, principal)
    }

    fn key(s: &str) -> InstanceKey {
        InstanceKey::new(s).unwrap()
    }

    #[tokio::test]
    async fn valid_key_resolves_principal() {
        let (repo, raw, stored) = seeded(PrincipalKind::User).await;
        let gate = AccessGate::new(repo);

        let principal = gate.validate(Some(&raw.raw)).await.unwrap();
        assert_eq!(principal.id, stored.id);
    }

    #[tokio::test]
    async fn missing_or_blank_key_is_rejected() {
        let gate = AccessGate::new(Arc::new(InMemoryApiKeyRepository::new()));
        assert_eq!(gate.validate(None).await.unwrap_err(), AuthError::MissingKey);
        assert_eq!(gate.validate(Some("  ")).await.unwrap_err(), AuthError::MissingKey);
    }

    #[tokio::test]
    async fn unknown_key_is_invalid() {
        let (repo, _, _) = seeded(PrincipalKind::User).await;
        let gate = AccessGate::new(repo);
        let other = GeneratedKey::generate(PrincipalKind::User);

        assert_eq!(gate.validate(Some(&other.raw)).await.unwrap_err(), AuthError::InvalidKey);
    }

    #[tokio::test]
    async fn padded_key_does_not_match_stored_hash() {
        let (repo, raw, _) = seeded(PrincipalKind::User).await;
        let gate = AccessGate::new(repo);

        let padded = format!(" {}\t", raw.raw);
        assert_eq!(gate.validate(Some(&padded)).await.unwrap_err(), AuthError::InvalidKey);
        assert!(gate.validate(Some(&raw.raw)).await.is_ok());
    }

    #[tokio::test]
    async fn inactive_key_is_rejected() {
        let (repo, raw, mut stored) = seeded(PrincipalKind::User).await;
        stored.active = false;
        repo.update(&stored).await.unwrap();
        let gate = AccessGate::new(repo);

        assert_eq!(gate.validate(Some(&raw.raw)).await.unwrap_err(), AuthError::InactiveKey);
    }

    #[tokio::test]
    async fn past_expiry_is_expired_key() {
        let (repo, raw, mut stored) = seeded(PrincipalKind::User).await;
        stored.expires_at = Some(Timestamp::now().add_days(-1));
        repo.update(&stored).await.unwrap();
        let gate = AccessGate::new(repo);

        assert_eq!(gate.validate(Some(&raw.raw)).await.unwrap_err(), AuthError::ExpiredKey);
    }

    #[tokio::test]
    async fn storage_failure_is_unavailable() {
        let gate = AccessGate::new(Arc::new(InMemoryApiKeyRepository::failing()));
        let err = gate.validate(Some("nxus_whatever")).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn successful_validation_records_usage() {
        let (repo, raw, stored) = seeded(PrincipalKind::User).await;
        let gate = AccessGate::new(repo.clone());

        gate.validate(Some(&raw.raw)).await.unwrap();

        let mut count = 0;
        for _ in 0..50 {
            count = repo.find_by_id(stored.id).await.unwrap().unwrap().request_count;
            if count == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(count, 1);
    }

    #[test]
    fn user_scope_is_enforced() {
        let p = principal(PrincipalKind::User, &["sales"]);
        assert!(AccessGate::authorize(&p, &key("sales")).is_ok());
        assert_eq!(
            AccessGate::authorize(&p, &key("support")).unwrap_err(),
            AuthzError::InstanceForbidden(key("support"))
        );
    }

    #[test]
    fn super_admin_is_allowed_anywhere() {
        let p = principal(PrincipalKind::SuperAdmin, &[]);
        assert!(AccessGate::authorize(&p, &key("support")).is_ok());
        assert!(AccessGate::require_super_admin(&p).is_ok());
    }

    #[test]
    fn user_is_not_super_admin() {
        let p = principal(PrincipalKind::User, &["sales"]);
        assert_eq!(
            AccessGate::require_super_admin(&p).unwrap_err(),
            AuthzError::SuperAdminRequired
        );
    }
}
