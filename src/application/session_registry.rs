//! Session registry - owns every live instance session.
//!
//! The registry is the only place session handles exist. Callers get
//! snapshots ([`InstanceInfo`]) and outcomes, never handles.
//!
//! Locking:
//! - `sessions` (one `RwLock`) guards the map; it is never held across an
//!   engine call or an event publish.
//! - a per-instance gate (`tokio::sync::Mutex`) serializes connect, logout
//!   and reconnect for the same key. Signal handling that only flips state
//!   takes the map lock alone.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::domain::directory::{Contact, GroupAction, NewGroup, SyncStatus};
use crate::domain::events::{EventKind, GatewayEvent};
use crate::domain::foundation::{InstanceKey, MessageId, PrincipalId, StateMachine, Timestamp};
use crate::domain::instance::{ConnectOutcome, ConnectionState, InstanceInfo, SessionError};
use crate::domain::messaging::{DeliveryOptions, DispatchError, OutboundMessage};
use crate::ports::{EngineSignal, EventPublisher, ProtocolEngine};

/// Timing knobs for the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRegistryConfig {
    /// How long `connect` waits for the first QR code.
    pub qr_timeout: Duration,
    /// Backoff before the single reconnect attempt.
    pub reconnect_delay: Duration,
    /// How long a login session nobody is waiting on (phone pairing, a
    /// reconnect that needs a new QR) may stay unpaired.
    pub login_window: Duration,
}

impl Default for SessionRegistryConfig {
    fn default() -> Self {
        Self {
            qr_timeout: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(2),
            login_window: Duration::from_secs(120),
        }
    }
}

/// Live engine connection: its cancellation token and identity.
struct SessionHandle {
    token: CancellationToken,
    generation: u64,
}

struct SessionSlot {
    state: ConnectionState,
    created_at: Timestamp,
    owner: Option<PrincipalId>,
    messages_sent: u64,
    ever_connected: bool,
    handle: Option<SessionHandle>,
    reconnect: Option<CancellationToken>,
}

impl SessionSlot {
    fn new(owner: Option<PrincipalId>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            created_at: Timestamp::now(),
            owner,
            messages_sent: 0,
            ever_connected: false,
            handle: None,
            reconnect: None,
        }
    }

    fn generation(&self) -> Option<u64> {
        self.handle.as_ref().map(|h| h.generation)
    }

    /// Applies a validated transition. Invalid ones are logged and skipped.
    fn transition(&mut self, instance: &InstanceKey, target: ConnectionState) -> bool {
        if self.state == target {
            return false;
        }
        match self.state.transition_to(target) {
            Ok(next) => {
                self.state = next;
                if next == ConnectionState::Connected {
                    self.ever_connected = true;
                }
                true
            }
            Err(e) => {
                tracing::warn!(%instance, from = %self.state, to = %target, error = %e, "Rejected state transition");
                false
            }
        }
    }

    /// Cancels the worker and any pending reconnect.
    fn release(&mut self) -> bool {
        let had_handle = match self.handle.take() {
            Some(handle) => {
                handle.token.cancel();
                true
            }
            None => false,
        };
        if let Some(token) = self.reconnect.take() {
            token.cancel();
        }
        had_handle
    }

    fn info(&self, instance: &InstanceKey) -> InstanceInfo {
        InstanceInfo {
            instance: instance.clone(),
            state: self.state,
            created_at: self.created_at,
            owner: self.owner,
            messages_sent: self.messages_sent,
        }
    }
}

/// What the disconnect path decided while holding the map lock.
enum CloseAction {
    Stale,
    Removed,
    Disconnected,
    Reconnect(CancellationToken),
}

struct Inner {
    engine: Arc<dyn ProtocolEngine>,
    events: Arc<dyn EventPublisher>,
    config: SessionRegistryConfig,
    sessions: RwLock<HashMap<InstanceKey, SessionSlot>>,
    gates: StdMutex<HashMap<InstanceKey, Arc<Mutex<()>>>>,
    generation: AtomicU64,
}

/// Registry of per-instance sessions. Cheap to clone.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<Inner>,
}

impl SessionRegistry {
    pub fn new(
        engine: Arc<dyn ProtocolEngine>,
        events: Arc<dyn EventPublisher>,
        config: SessionRegistryConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                events,
                config,
                sessions: RwLock::new(HashMap::new()),
                gates: StdMutex::new(HashMap::new()),
                generation: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> SessionRegistryConfig {
        self.inner.config
    }

    /// Brings an instance online.
    ///
    /// - already connected: `AlreadyConnected`, nothing else happens
    /// - engine restored credentials: `SessionRestored`
    /// - otherwise waits up to the QR deadline for the first pairing code
    ///
    /// # Errors
    ///
    /// - `PairingFailed` if the engine cannot open a session
    /// - `Timeout` if no code arrives in time (the attempt is torn down)
    /// - `Cancelled` if a logout or newer connect supersedes this one
    pub async fn connect(
        &self,
        instance: &InstanceKey,
        owner: Option<PrincipalId>,
    ) -> Result<ConnectOutcome, SessionError> {
        self.inner.connect(instance, owner).await
    }

    /// Removes the instance, cancels its worker and pending reconnect and asks
    /// the engine to wipe credentials. Returns false (and does nothing) if the
    /// instance is not registered.
    pub async fn logout(&self, instance: &InstanceKey) -> bool {
        self.inner.logout(instance).await
    }

    /// Requests a numeric pairing code for `phone`, opening a login session
    /// first if none is live.
    pub async fn pair_by_phone(
        &self,
        instance: &InstanceKey,
        phone: &str,
        owner: Option<PrincipalId>,
    ) -> Result<String, SessionError> {
        self.inner.pair_by_phone(instance, phone, owner).await
    }

    pub async fn info(&self, instance: &InstanceKey) -> Result<InstanceInfo, SessionError> {
        self.inner
            .sessions
            .read()
            .await
            .get(instance)
            .map(|slot| slot.info(instance))
            .ok_or_else(|| SessionError::NotFound(instance.clone()))
    }

    pub async fn state(&self, instance: &InstanceKey) -> Option<ConnectionState> {
        self.inner
            .sessions
            .read()
            .await
            .get(instance)
            .map(|slot| slot.state)
    }

    /// Snapshots of every registered instance, ordered by key.
    pub async fn list(&self) -> Vec<InstanceInfo> {
        let sessions = self.inner.sessions.read().await;
        let mut infos: Vec<_> = sessions.iter().map(|(k, s)| s.info(k)).collect();
        infos.sort_by(|a, b| a.instance.cmp(&b.instance));
        infos
    }

    pub async fn is_connected(&self, instance: &InstanceKey) -> bool {
        self.state(instance).await == Some(ConnectionState::Connected)
    }

    /// Sends through the live session and bumps the sent counter.
    ///
    /// The connection is checked before the engine is called; nothing reaches
    /// the engine when the instance is not connected.
    pub async fn send(
        &self,
        instance: &InstanceKey,
        to: &str,
        message: &OutboundMessage,
        options: &DeliveryOptions,
    ) -> Result<MessageId, DispatchError> {
        if !self.is_connected(instance).await {
            return Err(DispatchError::NotConnected(instance.clone()));
        }

        let id = self
            .inner
            .engine
            .send_message(instance, to, message, options)
            .await
            .map_err(|e| DispatchError::SendFailed(e.to_string()))?;

        if let Some(slot) = self.inner.sessions.write().await.get_mut(instance) {
            slot.messages_sent += 1;
        }
        Ok(id)
    }

    async fn require_connected(&self, instance: &InstanceKey) -> Result<(), SessionError> {
        if self.is_connected(instance).await {
            Ok(())
        } else {
            Err(SessionError::NotConnected(instance.clone()))
        }
    }

    /// Creates a group through the live session; returns the group JID.
    pub async fn create_group(
        &self,
        instance: &InstanceKey,
        group: &NewGroup,
    ) -> Result<String, SessionError> {
        self.require_connected(instance).await?;
        let group_id = self
            .inner
            .engine
            .create_group(instance, group)
            .await
            .map_err(|e| SessionError::EngineFailed(e.to_string()))?;
        tracing::info!(%instance, %group_id, members = group.participants.len(), "Group created");
        Ok(group_id)
    }

    pub async fn update_group_participants(
        &self,
        instance: &InstanceKey,
        group_id: &str,
        participants: &[String],
        action: GroupAction,
    ) -> Result<(), SessionError> {
        self.require_connected(instance).await?;
        self.inner
            .engine
            .group_action(instance, group_id, participants, action)
            .await
            .map_err(|e| SessionError::EngineFailed(e.to_string()))
    }

    pub async fn search_contacts(
        &self,
        instance: &InstanceKey,
        query: &str,
    ) -> Result<Vec<Contact>, SessionError> {
        self.require_connected(instance).await?;
        self.inner
            .engine
            .search_contacts(instance, query)
            .await
            .map_err(|e| SessionError::EngineFailed(e.to_string()))
    }

    pub async fn trigger_sync(&self, instance: &InstanceKey) -> Result<(), SessionError> {
        self.require_connected(instance).await?;
        self.inner
            .engine
            .trigger_sync(instance)
            .await
            .map_err(|e| SessionError::EngineFailed(e.to_string()))
    }

    /// History sync progress. An engine failure reads as "not syncing".
    pub async fn sync_status(&self, instance: &InstanceKey) -> Result<SyncStatus, SessionError> {
        self.require_connected(instance).await?;
        Ok(self
            .inner
            .engine
            .sync_status(instance)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(%instance, error = %e, "Failed to read sync status");
                SyncStatus::default()
            }))
    }

    /// Cancels every worker and pending reconnect. Used on shutdown.
    pub async fn shutdown(&self) {
        let mut sessions = self.inner.sessions.write().await;
        for slot in sessions.values_mut() {
            slot.release();
        }
        tracing::info!(sessions = sessions.len(), "Session registry shut down");
    }
}

impl Inner {
    fn gate(&self, instance: &InstanceKey) -> Arc<Mutex<()>> {
        let mut gates = match self.gates.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        gates.entry(instance.clone()).or_default().clone()
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed)
    }

    fn publish_state(&self, instance: &InstanceKey, state: ConnectionState, reason: Option<&str>) {
        self.events
            .publish(GatewayEvent::connection_update(instance.clone(), state, reason));
    }

    async fn connect(
        self: &Arc<Self>,
        instance: &InstanceKey,
        owner: Option<PrincipalId>,
    ) -> Result<ConnectOutcome, SessionError> {
        let gate = self.gate(instance);
        let guard = gate.lock().await;

        if self.sessions.read().await.get(instance).map(|s| s.state)
            == Some(ConnectionState::Connected)
        {
            tracing::debug!(%instance, "Connect on connected instance");
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        self.teardown_stale(instance).await;

        let session = self.engine.connect(instance).await.map_err(|e| {
            tracing::warn!(%instance, error = %e, "Engine refused to open session");
            SessionError::pairing_failed(e.to_string())
        })?;

        let generation = self.next_generation();
        let token = CancellationToken::new();

        if session.restored {
            self.install(instance, owner, generation, &token, ConnectionState::Connected)
                .await;
            self.spawn_worker(instance.clone(), generation, token, session.signals, None);
            drop(guard);

            tracing::info!(%instance, "Session restored from stored credentials");
            self.publish_state(instance, ConnectionState::Connected, None);
            return Ok(ConnectOutcome::SessionRestored);
        }

        let (qr_tx, qr_rx) = oneshot::channel();
        self.install(instance, owner, generation, &token, ConnectionState::AwaitingQr)
            .await;
        self.spawn_worker(
            instance.clone(),
            generation,
            token.clone(),
            session.signals,
            Some(qr_tx),
        );
        drop(guard);

        self.publish_state(instance, ConnectionState::AwaitingQr, None);
        tracing::info!(%instance, timeout_secs = self.config.qr_timeout.as_secs(), "Waiting for QR code");

        tokio::select! {
            biased;
            code = qr_rx => match code {
                Ok(code) => Ok(ConnectOutcome::QrCode(code)),
                // Worker ended without a code: either it opened straight
                // away or the engine closed the attempt.
                Err(_) => match self.sessions.read().await.get(instance).map(|s| s.state) {
                    Some(ConnectionState::Connected) => Ok(ConnectOutcome::SessionRestored),
                    _ if token.is_cancelled() => Err(SessionError::Cancelled(instance.clone())),
                    _ => Err(SessionError::pairing_failed("engine closed before producing a QR code")),
                },
            },
            _ = token.cancelled() => Err(SessionError::Cancelled(instance.clone())),
            _ = tokio::time::sleep(self.config.qr_timeout) => {
                if self.abandon_login(instance, generation, "qr_timeout").await {
                    return Err(SessionError::Timeout(self.config.qr_timeout.as_secs()));
                }
                // Lost the race to an `Opened` signal or a newer attempt.
                match self.sessions.read().await.get(instance).map(|s| s.state) {
                    Some(ConnectionState::Connected) => Ok(ConnectOutcome::SessionRestored),
                    _ => Err(SessionError::Cancelled(instance.clone())),
                }
            }
        }
    }

    /// Stops whatever half-open attempt exists before a fresh connect.
    /// Caller holds the instance gate.
    async fn teardown_stale(&self, instance: &InstanceKey) {
        let had_handle = match self.sessions.write().await.get_mut(instance) {
            Some(slot) => slot.release(),
            None => false,
        };
        if had_handle {
            tracing::debug!(%instance, "Superseding previous login attempt");
            if let Err(e) = self.engine.disconnect(instance).await {
                tracing::warn!(%instance, error = %e, "Engine disconnect failed");
            }
        }
    }

    /// Registers (or refreshes) the slot with a new handle and state.
    async fn install(
        &self,
        instance: &InstanceKey,
        owner: Option<PrincipalId>,
        generation: u64,
        token: &CancellationToken,
        state: ConnectionState,
    ) {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .entry(instance.clone())
            .or_insert_with(|| SessionSlot::new(owner));
        if slot.owner.is_none() {
            slot.owner = owner;
        }
        slot.handle = Some(SessionHandle {
            token: token.clone(),
            generation,
        });
        slot.transition(instance, state);
    }

    /// Login deadline passed: stop the worker, close the engine connection
    /// and drop the slot if the instance never got online. Returns false when
    /// the attempt already connected or was superseded.
    async fn abandon_login(&self, instance: &InstanceKey, generation: u64, reason: &str) -> bool {
        let gate = self.gate(instance);
        let _guard = gate.lock().await;

        let owned = {
            let mut sessions = self.sessions.write().await;
            match sessions.get_mut(instance) {
                Some(slot)
                    if slot.generation() == Some(generation)
                        && slot.state != ConnectionState::Connected =>
                {
                    slot.release();
                    if slot.ever_connected {
                        slot.transition(instance, ConnectionState::Disconnected);
                    } else {
                        sessions.remove(instance);
                    }
                    true
                }
                _ => false,
            }
        };

        if owned {
            tracing::info!(%instance, reason, "Login attempt expired, abandoning it");
            if let Err(e) = self.engine.disconnect(instance).await {
                tracing::warn!(%instance, error = %e, "Engine disconnect failed");
            }
            self.publish_state(instance, ConnectionState::Disconnected, Some(reason));
        }
        owned
    }

    /// Bounds a login session that has no caller waiting on it. The timer
    /// ends early when the session's worker token is cancelled.
    fn spawn_login_deadline(
        self: &Arc<Self>,
        instance: InstanceKey,
        generation: u64,
        token: CancellationToken,
    ) {
        let inner = Arc::clone(self);
        let window = self.config.login_window;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(window) => {
                    inner.abandon_login(&instance, generation, "login_timeout").await;
                }
            }
        });
    }

    async fn logout(&self, instance: &InstanceKey) -> bool {
        let gate = self.gate(instance);
        let _guard = gate.lock().await;

        let removed = self.sessions.write().await.remove(instance);
        let Some(mut slot) = removed else {
            tracing::debug!(%instance, "Logout of unknown instance ignored");
            return false;
        };
        slot.release();

        if let Err(e) = self.engine.logout(instance).await {
            tracing::warn!(%instance, error = %e, "Engine logout failed");
        }
        tracing::info!(%instance, "Instance logged out");
        self.publish_state(instance, ConnectionState::Disconnected, Some("logout"));
        true
    }

    async fn pair_by_phone(
        self: &Arc<Self>,
        instance: &InstanceKey,
        phone: &str,
        owner: Option<PrincipalId>,
    ) -> Result<String, SessionError> {
        let gate = self.gate(instance);
        let _guard = gate.lock().await;

        let live = {
            let sessions = self.sessions.read().await;
            match sessions.get(instance) {
                Some(slot) if slot.state == ConnectionState::Connected => {
                    return Err(SessionError::AlreadyConnected(instance.clone()));
                }
                Some(slot) => slot.handle.is_some(),
                None => false,
            }
        };

        if !live {
            self.teardown_stale(instance).await;
            let session = self
                .engine
                .connect(instance)
                .await
                .map_err(|e| SessionError::pairing_failed(e.to_string()))?;
            let generation = self.next_generation();
            let token = CancellationToken::new();
            let state = if session.restored {
                ConnectionState::Connected
            } else {
                ConnectionState::AwaitingQr
            };
            self.install(instance, owner, generation, &token, state).await;
            self.spawn_worker(instance.clone(), generation, token.clone(), session.signals, None);
            self.publish_state(instance, state, None);
            if session.restored {
                return Err(SessionError::AlreadyConnected(instance.clone()));
            }
            self.spawn_login_deadline(instance.clone(), generation, token);
        }

        self.engine
            .pair_by_phone(instance, phone)
            .await
            .map_err(|e| SessionError::pairing_failed(e.to_string()))
    }

    fn spawn_worker(
        self: &Arc<Self>,
        instance: InstanceKey,
        generation: u64,
        token: CancellationToken,
        signals: mpsc::Receiver<EngineSignal>,
        qr_tx: Option<oneshot::Sender<String>>,
    ) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner
                .run_worker(instance, generation, token, signals, qr_tx)
                .await;
        });
    }

    async fn run_worker(
        self: Arc<Self>,
        instance: InstanceKey,
        generation: u64,
        token: CancellationToken,
        mut signals: mpsc::Receiver<EngineSignal>,
        mut qr_tx: Option<oneshot::Sender<String>>,
    ) {
        loop {
            let signal = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                signal = signals.recv() => signal,
            };

            match signal {
                Some(EngineSignal::QrCode(code)) => {
                    if let Some(tx) = qr_tx.take() {
                        let _ = tx.send(code.clone());
                    }
                    self.events
                        .publish(GatewayEvent::qr_update(instance.clone(), &code));
                }
                Some(EngineSignal::Opened) => {
                    // A pending connect waiting for a QR resolves as restored;
                    // the state must read Connected before its channel closes.
                    self.mark_connected(&instance, generation).await;
                    qr_tx.take();
                }
                Some(EngineSignal::Closed { logged_out, reason }) => {
                    qr_tx.take();
                    self.handle_closed(&instance, generation, logged_out, &reason)
                        .await;
                    break;
                }
                Some(EngineSignal::MessageReceived(payload)) => {
                    self.events.publish(GatewayEvent::new(
                        instance.clone(),
                        EventKind::MessageReceived,
                        payload,
                    ));
                }
                Some(EngineSignal::Receipt(payload)) => {
                    self.events.publish(GatewayEvent::new(
                        instance.clone(),
                        EventKind::MessageReceipt,
                        payload,
                    ));
                }
                None => {
                    qr_tx.take();
                    self.handle_closed(&instance, generation, false, "signal stream ended")
                        .await;
                    break;
                }
            }
        }
        tracing::debug!(%instance, generation, "Session worker stopped");
    }

    async fn mark_connected(&self, instance: &InstanceKey, generation: u64) {
        let changed = {
            let mut sessions = self.sessions.write().await;
            match sessions.get_mut(instance) {
                Some(slot) if slot.generation() == Some(generation) => {
                    slot.transition(instance, ConnectionState::Connected)
                }
                _ => false,
            }
        };
        if changed {
            tracing::info!(%instance, "Instance connected");
            self.publish_state(instance, ConnectionState::Connected, None);
        }
    }

    async fn handle_closed(
        self: &Arc<Self>,
        instance: &InstanceKey,
        generation: u64,
        logged_out: bool,
        reason: &str,
    ) {
        let gate = self.gate(instance);
        let _guard = gate.lock().await;

        let action = {
            let mut sessions = self.sessions.write().await;
            match sessions.get_mut(instance) {
                Some(slot) if slot.generation() == Some(generation) => {
                    let was_connected = slot.state == ConnectionState::Connected;
                    slot.release();
                    if logged_out {
                        sessions.remove(instance);
                        CloseAction::Removed
                    } else {
                        slot.transition(instance, ConnectionState::Disconnected);
                        if was_connected {
                            let token = CancellationToken::new();
                            slot.reconnect = Some(token.clone());
                            slot.transition(instance, ConnectionState::Reconnecting);
                            CloseAction::Reconnect(token)
                        } else {
                            CloseAction::Disconnected
                        }
                    }
                }
                _ => CloseAction::Stale,
            }
        };

        match action {
            CloseAction::Stale => {}
            CloseAction::Removed => {
                tracing::warn!(%instance, reason, "Instance logged out remotely, session wiped");
                if let Err(e) = self.engine.logout(instance).await {
                    tracing::warn!(%instance, error = %e, "Engine logout failed");
                }
                self.publish_state(instance, ConnectionState::Disconnected, Some("logged_out"));
            }
            CloseAction::Disconnected => {
                tracing::info!(%instance, reason, "Login attempt closed by engine");
                self.publish_state(instance, ConnectionState::Disconnected, Some(reason));
            }
            CloseAction::Reconnect(token) => {
                tracing::warn!(
                    %instance,
                    reason,
                    delay_ms = self.config.reconnect_delay.as_millis() as u64,
                    "Connection lost, scheduling reconnect"
                );
                self.publish_state(instance, ConnectionState::Disconnected, Some(reason));
                self.publish_state(instance, ConnectionState::Reconnecting, None);
                self.schedule_reconnect(instance.clone(), token);
            }
        }
    }

    fn schedule_reconnect(self: &Arc<Self>, instance: InstanceKey, token: CancellationToken) {
        let inner = Arc::clone(self);
        let delay = self.config.reconnect_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(%instance, "Scheduled reconnect cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    inner.retry_connect(&instance, &token).await;
                }
            }
        });
    }

    /// The single reconnect attempt for one disconnect.
    async fn retry_connect(self: &Arc<Self>, instance: &InstanceKey, token: &CancellationToken) {
        let gate = self.gate(instance);
        let _guard = gate.lock().await;

        // Logout or a manual connect may have won the race for the gate.
        if token.is_cancelled() {
            return;
        }
        match self.sessions.write().await.get_mut(instance) {
            Some(slot) if slot.state == ConnectionState::Reconnecting => {
                slot.reconnect = None;
            }
            _ => return,
        }

        match self.engine.connect(instance).await {
            Ok(session) => {
                let generation = self.next_generation();
                let worker_token = CancellationToken::new();
                let state = if session.restored {
                    ConnectionState::Connected
                } else {
                    ConnectionState::AwaitingQr
                };
                self.install(instance, None, generation, &worker_token, state)
                    .await;
                self.spawn_worker(
                    instance.clone(),
                    generation,
                    worker_token.clone(),
                    session.signals,
                    None,
                );
                tracing::info!(%instance, state = %state, "Reconnect attempt finished");
                self.publish_state(instance, state, None);
                if !session.restored {
                    self.spawn_login_deadline(instance.clone(), generation, worker_token);
                }
            }
            Err(e) => {
                if let Some(slot) = self.sessions.write().await.get_mut(instance) {
                    slot.transition(instance, ConnectionState::Disconnected);
                }
                tracing::warn!(%instance, error = %e, "Reconnect failed, instance stays disconnected");
                self.publish_state(instance, ConnectionState::Disconnected, Some("reconnect_failed"));
            }
        }
    }
}
