//! Command and query handlers.
//!
//! Each handler is a small struct holding the ports it needs, with a single
//! `handle` entry point.

pub mod access;
pub mod instances;
pub mod messaging;

pub use access::{
    ensure_bootstrap_key, AccessGate, ApiKeyView, IssueApiKeyCommand, IssueApiKeyHandler,
    IssueApiKeyResult, ListApiKeysHandler, RevokeApiKeyCommand, RevokeApiKeyHandler,
    UpdateApiKeyCommand, UpdateApiKeyHandler,
};
pub use instances::{
    DeleteInstanceCommand, DeleteInstanceHandler, InstanceSummary, ListInstancesHandler,
    MirrorQueries, RegisterInstanceCommand, RegisterInstanceHandler, MESSAGE_HISTORY_LIMIT,
};
pub use messaging::{DispatchMessageCommand, MessageDispatcher};
