//! IssueApiKeyHandler - Command handler for creating API keys.

use std::sync::Arc;

use tracing::info;

use crate::domain::access::{ApiKeyError, GeneratedKey, NewPrincipal, Principal, PrincipalKind, Validity};
use crate::domain::foundation::Timestamp;
use crate::ports::ApiKeyRepository;

use super::instance_scope;

/// Command to issue a new API key.
#[derive(Debug, Clone)]
pub struct IssueApiKeyCommand {
    pub name: String,
    pub kind: PrincipalKind,
    pub allowed_instances: Vec<String>,
    /// One of "30", "90", "180", "365"; absent means no expiry.
    pub validity: Option<String>,
}

/// The stored principal plus the raw key. The raw key is never retrievable again.
#[derive(Debug, Clone)]
pub struct IssueApiKeyResult {
    pub principal: Principal,
    pub raw_key: String,
}

pub struct IssueApiKeyHandler {
    keys: Arc<dyn ApiKeyRepository>,
}

impl IssueApiKeyHandler {
    pub fn new(keys: Arc<dyn ApiKeyRepository>) -> Self {
        Self { keys }
    }

    pub async fn handle(&self, cmd: IssueApiKeyCommand) -> Result<IssueApiKeyResult, ApiKeyError> {
        let name = NewPrincipal::validate_name(&cmd.name)?;
        let validity = Validity::parse_optional(cmd.validity.as_deref())?;
        let allowed_instances = instance_scope(&cmd.allowed_instances)?;

        let key = GeneratedKey::generate(cmd.kind);
        let principal = self
            .keys
            .insert(NewPrincipal {
                key_hash: key.hash,
                key_prefix: key.prefix,
                name,
                kind: cmd.kind,
                allowed_instances,
                expires_at: validity.map(|v| v.expires_at(Timestamp::now())),
            })
            .await?;

        info!(
            principal_id = %principal.id,
            kind = %principal.kind,
            prefix = %principal.key_prefix,
            "Issued API key"
        );

        Ok(IssueApiKeyResult {
            principal,
            raw_key: key.raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryApiKeyRepository;
    use crate::domain::access::{hash_key, KEY_PREFIX_LEN};

    fn command(validity: Option<&str>) -> IssueApiKeyCommand {
        IssueApiKeyCommand {
            name: "ops".to_string(),
            kind: PrincipalKind::User,
            allowed_instances: vec!["sales".to_string()],
            validity: validity.map(String::from),
        }
    }

    #[tokio::test]
    async fn issues_user_key_with_thirty_day_validity() {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let handler = IssueApiKeyHandler::new(repo.clone());

        let result = handler.handle(command(Some("30"))).await.unwrap();

        assert_eq!(result.principal.key_prefix.len(), KEY_PREFIX_LEN);
        assert!(result.raw_key.starts_with("nxus_"));
        assert_eq!(result.raw_key.len(), 5 + 48);
        assert!(result.raw_key.starts_with(&result.principal.key_prefix));

        let expires = *result.principal.expires_at.unwrap().as_datetime();
        let expected = *Timestamp::now().add_days(30).as_datetime();
        assert!((expected - expires).num_seconds().abs() < 5);
    }

    #[tokio::test]
    async fn only_the_hash_is_stored() {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let handler = IssueApiKeyHandler::new(repo.clone());

        let result = handler.handle(command(None)).await.unwrap();
        let stored = repo.find_by_id(result.principal.id).await.unwrap().unwrap();

        assert_eq!(stored.key_hash, hash_key(&result.raw_key));
        assert_ne!(stored.key_hash, result.raw_key);
        assert!(stored.expires_at.is_none());
        let json = serde_json::to_string(&stored).unwrap();
        assert!(!json.contains(&result.raw_key));
    }

    #[tokio::test]
    async fn super_admin_keys_use_their_own_scheme() {
        let handler = IssueApiKeyHandler::new(Arc::new(InMemoryApiKeyRepository::new()));
        let mut cmd = command(None);
        cmd.kind = PrincipalKind::SuperAdmin;

        let result = handler.handle(cmd).await.unwrap();
        assert!(result.raw_key.starts_with("nxsa_"));
    }

    #[tokio::test]
    async fn unknown_validity_is_rejected() {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let handler = IssueApiKeyHandler::new(repo.clone());

        let err = handler.handle(command(Some("60"))).await.unwrap_err();
        assert!(matches!(err, ApiKeyError::Validation(_)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let handler = IssueApiKeyHandler::new(Arc::new(InMemoryApiKeyRepository::new()));
        let mut cmd = command(None);
        cmd.name = "  ".to_string();

        assert!(matches!(handler.handle(cmd).await, Err(ApiKeyError::Validation(_))));
    }

    #[tokio::test]
    async fn malformed_instance_name_is_rejected() {
        let handler = IssueApiKeyHandler::new(Arc::new(InMemoryApiKeyRepository::new()));
        let mut cmd = command(None);
        cmd.allowed_instances = vec!["bad name!".to_string()];

        assert!(matches!(handler.handle(cmd).await, Err(ApiKeyError::Validation(_))));
    }

    #[tokio::test]
    async fn storage_failure_surfaces() {
        let handler = IssueApiKeyHandler::new(Arc::new(InMemoryApiKeyRepository::failing()));
        assert!(matches!(
            handler.handle(command(None)).await,
            Err(ApiKeyError::Storage(_))
        ));
    }
}
