//! RevokeApiKeyHandler - Command handler for deleting API keys.

use std::sync::Arc;

use tracing::info;

use crate::domain::access::ApiKeyError;
use crate::domain::foundation::PrincipalId;
use crate::ports::ApiKeyRepository;

#[derive(Debug, Clone, Copy)]
pub struct RevokeApiKeyCommand {
    pub id: PrincipalId,
    pub requested_by: PrincipalId,
}

pub struct RevokeApiKeyHandler {
    keys: Arc<dyn ApiKeyRepository>,
}

impl RevokeApiKeyHandler {
    pub fn new(keys: Arc<dyn ApiKeyRepository>) -> Self {
        Self { keys }
    }

    pub async fn handle(&self, cmd: RevokeApiKeyCommand) -> Result<(), ApiKeyError> {
        if cmd.id == cmd.requested_by {
            return Err(ApiKeyError::CannotRevokeSelf);
        }
        if !self.keys.delete(cmd.id).await? {
            return Err(ApiKeyError::NotFound(cmd.id));
        }
        info!(principal_id = %cmd.id, revoked_by = %cmd.requested_by, "Revoked API key");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryApiKeyRepository;
    use crate::domain::access::{NewPrincipal, PrincipalKind};

    async fn seeded() -> (Arc<InMemoryApiKeyRepository>, PrincipalId) {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let p = repo
            .insert(NewPrincipal {
                key_hash: "h".to_string(),
                key_prefix: "nxus_abc".to_string(),
                name: "ops".to_string(),
                kind: PrincipalKind::User,
                allowed_instances: Default::default(),
                expires_at: None,
            })
            .await
            .unwrap();
        (repo, p.id)
    }

    #[tokio::test]
    async fn revokes_other_key() {
        let (repo, id) = seeded().await;
        let handler = RevokeApiKeyHandler::new(repo.clone());

        handler
            .handle(RevokeApiKeyCommand {
                id,
                requested_by: PrincipalId::new(99),
            })
            .await
            .unwrap();
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn cannot_revoke_own_key() {
        let (repo, id) = seeded().await;
        let handler = RevokeApiKeyHandler::new(repo.clone());

        let err = handler
            .handle(RevokeApiKeyCommand { id, requested_by: id })
            .await
            .unwrap_err();
        assert_eq!(err, ApiKeyError::CannotRevokeSelf);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let handler = RevokeApiKeyHandler::new(Arc::new(InMemoryApiKeyRepository::new()));
        let err = handler
            .handle(RevokeApiKeyCommand {
                id: PrincipalId::new(5),
                requested_by: PrincipalId::new(1),
            })
            .await
            .unwrap_err();
        assert_eq!(err, ApiKeyError::NotFound(PrincipalId::new(5)));
    }
}
