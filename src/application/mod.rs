//! Application layer - the session registry plus command and query handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;
mod session_registry;

pub use handlers::{
    // Access control
    ensure_bootstrap_key, AccessGate, ApiKeyView, IssueApiKeyCommand, IssueApiKeyHandler,
    IssueApiKeyResult, ListApiKeysHandler, RevokeApiKeyCommand, RevokeApiKeyHandler,
    UpdateApiKeyCommand, UpdateApiKeyHandler,
    // Instances
    DeleteInstanceCommand, DeleteInstanceHandler, InstanceSummary, ListInstancesHandler,
    MirrorQueries, RegisterInstanceCommand, RegisterInstanceHandler, MESSAGE_HISTORY_LIMIT,
    // Messaging
    DispatchMessageCommand, MessageDispatcher,
};
pub use session_registry::{SessionRegistry, SessionRegistryConfig};
