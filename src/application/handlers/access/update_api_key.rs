//! UpdateApiKeyHandler - Command handler for administrative key updates.

use std::sync::Arc;

use tracing::info;

use crate::domain::access::{ApiKeyError, NewPrincipal, Principal, PrincipalKind, PrincipalUpdate, Validity};
use crate::domain::foundation::{PrincipalId, Timestamp};
use crate::ports::ApiKeyRepository;

use super::instance_scope;

#[derive(Debug, Clone, Default)]
pub struct UpdateApiKeyCommand {
    pub id: PrincipalId,
    pub name: Option<String>,
    pub active: Option<bool>,
    pub kind: Option<PrincipalKind>,
    pub allowed_instances: Option<Vec<String>>,
    /// Restarts the validity window from now.
    pub renew_validity: Option<String>,
}

pub struct UpdateApiKeyHandler {
    keys: Arc<dyn ApiKeyRepository>,
}

impl UpdateApiKeyHandler {
    pub fn new(keys: Arc<dyn ApiKeyRepository>) -> Self {
        Self { keys }
    }

    pub async fn handle(&self, cmd: UpdateApiKeyCommand) -> Result<Principal, ApiKeyError> {
        let update = PrincipalUpdate {
            name: cmd.name.as_deref().map(NewPrincipal::validate_name).transpose()?,
            active: cmd.active,
            kind: cmd.kind,
            allowed_instances: cmd.allowed_instances.as_deref().map(instance_scope).transpose()?,
            renew_validity: Validity::parse_optional(cmd.renew_validity.as_deref())?,
        };

        let mut principal = self
            .keys
            .find_by_id(cmd.id)
            .await?
            .ok_or(ApiKeyError::NotFound(cmd.id))?;

        if update.is_empty() {
            return Ok(principal);
        }

        update.apply_to(&mut principal, Timestamp::now());
        self.keys.update(&principal).await?;

        info!(principal_id = %principal.id, active = principal.active, "Updated API key");
        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryApiKeyRepository;

    async fn seeded() -> (Arc<InMemoryApiKeyRepository>, Principal) {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let p = repo
            .insert(NewPrincipal {
                key_hash: "h".to_string(),
                key_prefix: "nxus_abc".to_string(),
                name: "ops".to_string(),
                kind: PrincipalKind::User,
                allowed_instances: Default::default(),
                expires_at: Some(Timestamp::now().add_days(-1)),
            })
            .await
            .unwrap();
        (repo, p)
    }

    #[tokio::test]
    async fn renewing_validity_revives_expired_key() {
        let (repo, p) = seeded().await;
        let handler = UpdateApiKeyHandler::new(repo.clone());

        let updated = handler
            .handle(UpdateApiKeyCommand {
                id: p.id,
                renew_validity: Some("90".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!updated.is_expired());
        assert!(!repo.find_by_id(p.id).await.unwrap().unwrap().is_expired());
    }

    #[tokio::test]
    async fn updates_scope_and_activity() {
        let (repo, p) = seeded().await;
        let handler = UpdateApiKeyHandler::new(repo);

        let updated = handler
            .handle(UpdateApiKeyCommand {
                id: p.id,
                active: Some(false),
                allowed_instances: Some(vec!["sales".to_string(), "support".to_string()]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!updated.active);
        assert_eq!(updated.allowed_instances.len(), 2);
        assert_eq!(updated.name, "ops");
    }

    #[tokio::test]
    async fn invalid_renewal_is_rejected() {
        let (repo, p) = seeded().await;
        let handler = UpdateApiKeyHandler::new(repo);

        let err = handler
            .handle(UpdateApiKeyCommand {
                id: p.id,
                renew_validity: Some("7".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiKeyError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let handler = UpdateApiKeyHandler::new(Arc::new(InMemoryApiKeyRepository::new()));
        let err = handler
            .handle(UpdateApiKeyCommand {
                id: PrincipalId::new(42),
                active: Some(true),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err, ApiKeyError::NotFound(PrincipalId::new(42)));
    }
}
