//! ListApiKeysHandler - Query handler for the administrative key listing.

use std::sync::Arc;

use crate::domain::access::{ApiKeyError, Principal};
use crate::ports::ApiKeyRepository;

/// A stored key as shown to administrators.
#[derive(Debug, Clone)]
pub struct ApiKeyView {
    pub principal: Principal,
    pub expired: bool,
}

impl From<Principal> for ApiKeyView {
    fn from(principal: Principal) -> Self {
        Self {
            expired: principal.is_expired(),
            principal,
        }
    }
}

pub struct ListApiKeysHandler {
    keys: Arc<dyn ApiKeyRepository>,
}

impl ListApiKeysHandler {
    pub fn new(keys: Arc<dyn ApiKeyRepository>) -> Self {
        Self { keys }
    }

    /// Newest first.
    pub async fn handle(&self) -> Result<Vec<ApiKeyView>, ApiKeyError> {
        let keys = self.keys.list().await?;
        Ok(keys.into_iter().map(ApiKeyView::from).collect())
    }
}
