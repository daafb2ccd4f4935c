//! ProtocolEngine port - the device-linking and wire-protocol engine.
//!
//! The gateway never speaks the messaging protocol itself. It asks the engine
//! to open, pair, send and close, and consumes a stream of signals the engine
//! emits for each open session.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::directory::{Contact, GroupAction, NewGroup, SyncStatus};
use crate::domain::foundation::{InstanceKey, MessageId};
use crate::domain::messaging::{DeliveryOptions, OutboundMessage};

/// Signals emitted by the engine for one open session.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSignal {
    /// A pairing code to present to the mobile client.
    QrCode(String),
    /// The session is authenticated and online.
    Opened,
    /// The connection closed. `logged_out` means credentials are gone.
    Closed { logged_out: bool, reason: String },
    MessageReceived(Value),
    Receipt(Value),
}

/// Result of asking the engine to open a session.
#[derive(Debug)]
pub struct EngineSession {
    /// Persisted credentials were accepted; no pairing needed.
    pub restored: bool,
    /// Signal stream. Ends when the engine drops the session.
    pub signals: mpsc::Receiver<EngineSignal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Engine rejected request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ProtocolEngine: Send + Sync {
    /// Open (or restore) a session for the instance.
    async fn connect(&self, instance: &InstanceKey) -> Result<EngineSession, EngineError>;

    /// Send one message through a connected session.
    async fn send_message(
        &self,
        instance: &InstanceKey,
        to: &str,
        message: &OutboundMessage,
        options: &DeliveryOptions,
    ) -> Result<MessageId, EngineError>;

    /// Request a numeric pairing code for a phone number.
    async fn pair_by_phone(&self, instance: &InstanceKey, phone: &str)
        -> Result<String, EngineError>;

    /// Close the connection, keeping credentials.
    async fn disconnect(&self, instance: &InstanceKey) -> Result<(), EngineError>;

    /// Close the connection and wipe credentials.
    async fn logout(&self, instance: &InstanceKey) -> Result<(), EngineError>;

    /// Create a group; returns its JID.
    async fn create_group(&self, instance: &InstanceKey, group: &NewGroup)
        -> Result<String, EngineError>;

    async fn group_action(
        &self,
        instance: &InstanceKey,
        group_id: &str,
        participants: &[String],
        action: GroupAction,
    ) -> Result<(), EngineError>;

    /// Contacts of the live session matching `query` (blank: all).
    async fn search_contacts(
        &self,
        instance: &InstanceKey,
        query: &str,
    ) -> Result<Vec<Contact>, EngineError>;

    /// Start a history sync.
    async fn trigger_sync(&self, instance: &InstanceKey) -> Result<(), EngineError>;

    async fn sync_status(&self, instance: &InstanceKey) -> Result<SyncStatus, EngineError>;
}
