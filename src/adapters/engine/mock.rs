//! Scripted protocol engine for testing.
//!
//! Each `connect` pops the next script for the instance (default: emit one
//! QR code). The signal sender is kept so tests can inject further signals
//! with [`MockProtocolEngine::push_signal`].
//!
//! ```ignore
//! let engine = Arc::new(
//!     MockProtocolEngine::new().with_script("sales", ConnectScript::Restored),
//! );
//! engine.push_signal("sales", EngineSignal::Closed { logged_out: false, reason: "io".into() }).await;
//! assert_eq!(engine.connect_count("sales"), 1);
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::domain::directory::{Contact, GroupAction, NewGroup, SyncStatus};
use crate::domain::foundation::{InstanceKey, MessageId};
use crate::domain::messaging::{DeliveryOptions, OutboundMessage};
use crate::ports::{EngineError, EngineSession, EngineSignal, ProtocolEngine};

/// What the mock does on one `connect` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectScript {
    /// Credentials accepted; no QR.
    Restored,
    /// Emit this QR code straight away.
    Qr(String),
    /// Open the session but never emit anything.
    Silent,
    /// Fail the connect call.
    Fail(String),
}

/// A group membership change the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupChange {
    pub instance: String,
    pub group_id: String,
    pub participants: Vec<String>,
    pub action: GroupAction,
}

/// A message the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub instance: String,
    pub to: String,
    pub message: OutboundMessage,
    pub options: DeliveryOptions,
}

#[derive(Default)]
struct MockState {
    scripts: HashMap<String, VecDeque<ConnectScript>>,
    senders: HashMap<String, mpsc::Sender<EngineSignal>>,
    connects: HashMap<String, usize>,
    disconnects: HashMap<String, usize>,
    logouts: HashMap<String, usize>,
    pair_requests: Vec<(String, String)>,
    sent: Vec<SentMessage>,
    send_error: Option<String>,
    groups: Vec<(String, NewGroup)>,
    group_changes: Vec<GroupChange>,
    contacts: HashMap<String, Vec<Contact>>,
    syncs: HashMap<String, usize>,
    directory_error: Option<String>,
}

#[derive(Default)]
pub struct MockProtocolEngine {
    state: Mutex<MockState>,
}

impl MockProtocolEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a script for the next `connect` of `instance`.
    pub fn with_script(self, instance: &str, script: ConnectScript) -> Self {
        self.add_script(instance, script);
        self
    }

    /// Makes every `send_message` fail with the given reason.
    pub fn with_send_error(self, reason: impl Into<String>) -> Self {
        self.state.lock().unwrap().send_error = Some(reason.into());
        self
    }

    /// Seeds a contact returned by `search_contacts` for `instance`.
    pub fn with_contact(self, instance: &str, jid: &str, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .contacts
            .entry(instance.to_string())
            .or_default()
            .push(Contact {
                jid: jid.to_string(),
                name: name.to_string(),
                is_group: jid.ends_with("@g.us"),
            });
        self
    }

    /// Makes every group, contact and sync call fail with the given reason.
    pub fn with_directory_error(self, reason: impl Into<String>) -> Self {
        self.state.lock().unwrap().directory_error = Some(reason.into());
        self
    }

    pub fn add_script(&self, instance: &str, script: ConnectScript) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .entry(instance.to_string())
            .or_default()
            .push_back(script);
    }

    /// Injects a signal into the live session of `instance`.
    ///
    /// Returns false if there is no live session.
    pub async fn push_signal(&self, instance: &str, signal: EngineSignal) -> bool {
        let sender = self.state.lock().unwrap().senders.get(instance).cloned();
        match sender {
            Some(tx) => tx.send(signal).await.is_ok(),
            None => false,
        }
    }

    pub fn connect_count(&self, instance: &str) -> usize {
        count(&self.state.lock().unwrap().connects, instance)
    }

    pub fn disconnect_count(&self, instance: &str) -> usize {
        count(&self.state.lock().unwrap().disconnects, instance)
    }

    pub fn logout_count(&self, instance: &str) -> usize {
        count(&self.state.lock().unwrap().logouts, instance)
    }

    pub fn pair_requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().pair_requests.clone()
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn has_live_session(&self, instance: &str) -> bool {
        self.state.lock().unwrap().senders.contains_key(instance)
    }

    pub fn created_groups(&self) -> Vec<(String, NewGroup)> {
        self.state.lock().unwrap().groups.clone()
    }

    pub fn group_changes(&self) -> Vec<GroupChange> {
        self.state.lock().unwrap().group_changes.clone()
    }

    pub fn sync_count(&self, instance: &str) -> usize {
        count(&self.state.lock().unwrap().syncs, instance)
    }
}

impl MockState {
    fn directory_check(&self) -> Result<(), EngineError> {
        match &self.directory_error {
            Some(reason) => Err(EngineError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }
}

fn count(map: &HashMap<String, usize>, instance: &str) -> usize {
    map.get(instance).copied().unwrap_or(0)
}

#[async_trait]
impl ProtocolEngine for MockProtocolEngine {
    async fn connect(&self, instance: &InstanceKey) -> Result<EngineSession, EngineError> {
        let mut state = self.state.lock().unwrap();
        let key = instance.to_string();
        let attempt = {
            let n = state.connects.entry(key.clone()).or_insert(0);
            *n += 1;
            *n
        };
        let script = state
            .scripts
            .get_mut(&key)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| ConnectScript::Qr(format!("qr-{}-{}", key, attempt)));

        let (tx, rx) = mpsc::channel(16);
        let restored = match script {
            ConnectScript::Fail(reason) => return Err(EngineError::Unavailable(reason)),
            ConnectScript::Restored => true,
            ConnectScript::Silent => false,
            ConnectScript::Qr(code) => {
                let _ = tx.try_send(EngineSignal::QrCode(code));
                false
            }
        };
        state.senders.insert(key, tx);

        Ok(EngineSession {
            restored,
            signals: rx,
        })
    }

    async fn send_message(
        &self,
        instance: &InstanceKey,
        to: &str,
        message: &OutboundMessage,
        options: &DeliveryOptions,
    ) -> Result<MessageId, EngineError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.send_error {
            return Err(EngineError::Rejected(reason.clone()));
        }
        state.sent.push(SentMessage {
            instance: instance.to_string(),
            to: to.to_string(),
            message: message.clone(),
            options: options.clone(),
        });
        Ok(MessageId::new(format!("MSG{}", state.sent.len())))
    }

    async fn pair_by_phone(
        &self,
        instance: &InstanceKey,
        phone: &str,
    ) -> Result<String, EngineError> {
        let mut state = self.state.lock().unwrap();
        state
            .pair_requests
            .push((instance.to_string(), phone.to_string()));
        Ok("ABCD-1234".to_string())
    }

    async fn disconnect(&self, instance: &InstanceKey) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        state.senders.remove(instance.as_str());
        *state.disconnects.entry(instance.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn logout(&self, instance: &InstanceKey) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        state.senders.remove(instance.as_str());
        *state.logouts.entry(instance.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn create_group(
        &self,
        instance: &InstanceKey,
        group: &NewGroup,
    ) -> Result<String, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.directory_check()?;
        state.groups.push((instance.to_string(), group.clone()));
        Ok(format!("GROUP{}@g.us", state.groups.len()))
    }

    async fn group_action(
        &self,
        instance: &InstanceKey,
        group_id: &str,
        participants: &[String],
        action: GroupAction,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        state.directory_check()?;
        state.group_changes.push(GroupChange {
            instance: instance.to_string(),
            group_id: group_id.to_string(),
            participants: participants.to_vec(),
            action,
        });
        Ok(())
    }

    async fn search_contacts(
        &self,
        instance: &InstanceKey,
        query: &str,
    ) -> Result<Vec<Contact>, EngineError> {
        let state = self.state.lock().unwrap();
        state.directory_check()?;
        Ok(state
            .contacts
            .get(instance.as_str())
            .map(|all| all.iter().filter(|c| c.matches(query)).cloned().collect())
            .unwrap_or_default())
    }

    async fn trigger_sync(&self, instance: &InstanceKey) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        state.directory_check()?;
        *state.syncs.entry(instance.to_string()).or_insert(0) += 1;
        Ok(())
    }

    /// Reports a sync as completed once one has been triggered.
    async fn sync_status(&self, instance: &InstanceKey) -> Result<SyncStatus, EngineError> {
        let state = self.state.lock().unwrap();
        state.directory_check()?;
        Ok(SyncStatus {
            syncing: false,
            completed: count(&state.syncs, instance.as_str()) > 0,
        })
    }
}
