//! Access control handlers: credential validation, scope checks and API-key
//! administration.

mod access_gate;
mod bootstrap_key;
mod issue_api_key;
mod list_api_keys;
mod revoke_api_key;
mod update_api_key;

pub use access_gate::AccessGate;
pub use bootstrap_key::ensure_bootstrap_key;
pub use issue_api_key::{IssueApiKeyCommand, IssueApiKeyHandler, IssueApiKeyResult};
pub use list_api_keys::{ApiKeyView, ListApiKeysHandler};
pub use revoke_api_key::{RevokeApiKeyCommand, RevokeApiKeyHandler};
pub use update_api_key::{UpdateApiKeyCommand, UpdateApiKeyHandler};

use std::collections::BTreeSet;

use crate::domain::foundation::{InstanceKey, ValidationError};

/// Normalizes a list of instance names into a validated set.
pub(crate) fn instance_scope(names: &[String]) -> Result<BTreeSet<String>, ValidationError> {
    names
        .iter()
        .map(|n| InstanceKey::new(n).map(|k| k.as_str().to_string()))
        .collect()
}
