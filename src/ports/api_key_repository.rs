//! API key repository port.
//!
//! Stores principals by key hash. Raw keys never reach this port.

use async_trait::async_trait;

use crate::domain::access::{NewPrincipal, Principal};
use crate::domain::foundation::{DomainError, PrincipalId, Timestamp};

#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Find the principal whose key hashes to `key_hash`.
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<Principal>, DomainError>;

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>, DomainError>;

    /// All principals, newest first.
    async fn list(&self) -> Result<Vec<Principal>, DomainError>;

    /// Insert a new principal and return it with its assigned id.
    async fn insert(&self, principal: NewPrincipal) -> Result<Principal, DomainError>;

    /// Persist mutable fields (name, active, kind, allowed instances, expiry).
    ///
    /// # Errors
    ///
    /// - `ApiKeyNotFound` if the principal doesn't exist
    async fn update(&self, principal: &Principal) -> Result<(), DomainError>;

    /// Returns false if no row was deleted.
    async fn delete(&self, id: PrincipalId) -> Result<bool, DomainError>;

    /// Stamp `last_used_at` and bump `request_count`.
    async fn record_usage(&self, id: PrincipalId, at: Timestamp) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn ApiKeyRepository) {}
    }
}
