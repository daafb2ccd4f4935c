use tracing::info;

use crate::domain::access::{GeneratedKey, NewPrincipal, PrincipalKind};
use crate::domain::foundation::DomainError;
use crate::ports::ApiKeyRepository;

/// Inserts the configured bootstrap super-admin key unless its hash is already
/// stored. Returns whether a row was created.
pub async fn ensure_bootstrap_key(
    keys: &dyn ApiKeyRepository,
    raw: &str,
) -> Result<bool, DomainError> {
    let key = GeneratedKey::from_raw(raw.trim());
    if keys.find_by_hash(&key.hash).await?.is_some() {
        return Ok(false);
    }

    let principal = keys
        .insert(NewPrincipal {
            key_hash: key.hash,
            key_prefix: key.prefix,
            name: "bootstrap".to_string(),
            kind: PrincipalKind::SuperAdmin,
            allowed_instances: Default::default(),
            expires_at: None,
        })
        .await?;
    info!(principal_id = %principal.id, prefix = %principal.key_prefix, "Inserted bootstrap super admin key");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryApiKeyRepository;
    use crate::domain::access::hash_key;

    #[tokio::test]
    async fn inserts_once() {
        let repo = InMemoryApiKeyRepository::new();
        assert!(ensure_bootstrap_key(&repo, "nxsa_bootstrap").await.unwrap());
        assert!(!ensure_bootstrap_key(&repo, "nxsa_bootstrap").await.unwrap());

        let stored = repo.find_by_hash(&hash_key("nxsa_bootstrap")).await.unwrap().unwrap();
        assert!(stored.is_super_admin());
        assert_eq!(repo.len(), 1);
    }
}
