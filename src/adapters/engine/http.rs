//! Sidecar engine - implementation of ProtocolEngine over the JSON HTTP API
//! of the protocol sidecar process.
//!
//! # Configuration
//!
//! ```ignore
//! let config = SidecarConfig::new("http://localhost:3001")
//!     .with_timeout(Duration::from_secs(50))
//!     .with_poll_interval(Duration::from_secs(2));
//!
//! let engine = HttpProtocolEngine::new(config)?;
//! ```
//!
//! # Signals
//!
//! The sidecar does not push. After `/session/start` a poller reads
//! `/v1/instance/:key/info` on a fixed interval and turns changes into
//! engine signals: a new pairing code, the session opening, or it closing.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::directory::{Contact, GroupAction, NewGroup, SyncStatus};
use crate::domain::foundation::{InstanceKey, MessageId};
use crate::domain::messaging::{DeliveryOptions, OutboundMessage};
use crate::ports::{EngineError, EngineSession, EngineSignal, ProtocolEngine};

/// Consecutive failed status polls tolerated before a session counts as closed.
const MAX_POLL_FAILURES: u32 = 3;

const SIGNAL_BUFFER: usize = 32;

#[derive(Debug, Clone)]
pub struct SidecarConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl SidecarConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(50),
            poll_interval: Duration::from_secs(2),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self::new("http://localhost:3001")
    }
}

/// Thin JSON client shared by the engine and its pollers.
#[derive(Clone)]
struct SidecarClient {
    client: Client,
    base_url: String,
}

impl SidecarClient {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, EngineError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(network_error)?;
        read_json(response).await
    }

    async fn get(&self, path: &str) -> Result<Value, EngineError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(network_error)?;
        read_json(response).await
    }

    async fn info(&self, instance: &InstanceKey) -> Result<Value, EngineError> {
        self.get(&format!("/v1/instance/{}/info", instance)).await
    }
}

fn network_error(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::Unavailable(format!("Sidecar timed out: {}", e))
    } else if e.is_connect() {
        EngineError::Unavailable(format!("Connection failed: {}", e))
    } else {
        EngineError::Unavailable(e.to_string())
    }
}

async fn read_json(response: Response) -> Result<Value, EngineError> {
    let status = response.status();
    let body = response.text().await.map_err(network_error)?;
    if !status.is_success() {
        return Err(EngineError::Rejected(format!("Sidecar responded {}: {}", status, body)));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body)
        .map_err(|e| EngineError::Rejected(format!("Failed to parse sidecar response: {}", e)))
}

#[derive(Debug, Default, Deserialize)]
struct StartResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    qrcode: String,
    #[serde(default)]
    error: String,
}

/// How `/session/start` answered.
#[derive(Debug, PartialEq, Eq)]
enum StartOutcome {
    Restored,
    Qr(Option<String>),
}

fn parse_start(body: Value) -> Result<StartResponse, EngineError> {
    if body.is_null() {
        return Err(EngineError::Rejected(
            "Sidecar sent an empty /session/start response".to_string(),
        ));
    }
    serde_json::from_value(body).map_err(|e| {
        EngineError::Rejected(format!("Malformed /session/start response: {}", e))
    })
}

fn interpret_start(response: StartResponse) -> Result<StartOutcome, EngineError> {
    if !response.error.is_empty() {
        return Err(EngineError::Rejected(response.error));
    }
    match response.status.as_str() {
        "CONNECTED" => Ok(StartOutcome::Restored),
        "QRCODE" if !response.qrcode.is_empty() => Ok(StartOutcome::Qr(Some(response.qrcode))),
        _ => Ok(StartOutcome::Qr(None)),
    }
}

/// What one status poll reported.
#[derive(Debug, PartialEq, Eq)]
enum Observed {
    Connected,
    Pending(Option<String>),
    Gone { logged_out: bool, reason: String },
}

fn classify(info: &Value) -> Observed {
    let status = info.get("status").and_then(Value::as_str).unwrap_or_default();
    match status {
        "connected" | "open" => Observed::Connected,
        "logged_out" | "loggedOut" => Observed::Gone {
            logged_out: true,
            reason: status.to_string(),
        },
        "qrcode" | "connecting" | "awaiting_qr" => Observed::Pending(
            info.get("qrcode")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(String::from),
        ),
        other => Observed::Gone {
            logged_out: false,
            reason: if other.is_empty() { "unknown".to_string() } else { other.to_string() },
        },
    }
}

/// Fails on a 2xx body that still carries an `error` field.
fn reject_error_field(response: Value) -> Result<Value, EngineError> {
    match response.get("error").and_then(Value::as_str).filter(|e| !e.is_empty()) {
        Some(error) => Err(EngineError::Rejected(error.to_string())),
        None => Ok(response),
    }
}

fn group_id_from(response: &Value) -> Result<String, EngineError> {
    ["group_id", "groupId", "id"]
        .iter()
        .find_map(|field| response.get(*field).and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .map(String::from)
        .ok_or_else(|| EngineError::Rejected("Sidecar returned no group id".to_string()))
}

/// Contact list from either a bare array or `{"contacts": [...]}`.
fn contacts_from(response: Value) -> Result<Vec<Contact>, EngineError> {
    let list = match response {
        Value::Null => return Ok(Vec::new()),
        Value::Object(mut map) => map.remove("contacts").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(list)
        .map_err(|e| EngineError::Rejected(format!("Malformed contact list: {}", e)))
}

fn sync_status_from(response: Value) -> Result<SyncStatus, EngineError> {
    if response.is_null() {
        return Ok(SyncStatus::default());
    }
    serde_json::from_value(response)
        .map_err(|e| EngineError::Rejected(format!("Malformed sync status: {}", e)))
}

/// Sidecar message id from a send response; `"sent"` when the sidecar omits it.
fn message_id_from(response: &Value) -> MessageId {
    response
        .pointer("/key/id")
        .and_then(Value::as_str)
        .map(MessageId::new)
        .unwrap_or_else(|| MessageId::new("sent"))
}

fn send_request(
    instance: &InstanceKey,
    to: &str,
    message: &OutboundMessage,
    options: &DeliveryOptions,
) -> (&'static str, Value) {
    match message {
        OutboundMessage::Text(text) => (
            "/v1/message/text",
            json!({ "instance": instance, "number": to, "text": text, "options": options }),
        ),
        OutboundMessage::Media(media) => (
            "/v1/message/media",
            json!({ "instance": instance, "number": to, "media": media, "options": options }),
        ),
        OutboundMessage::NativeFlow(flow) => (
            "/v1/message/interactive",
            json!({ "instance": instance, "number": to, "interactive": flow, "options": options }),
        ),
    }
}

pub struct HttpProtocolEngine {
    sidecar: SidecarClient,
    poll_interval: Duration,
    pollers: Mutex<HashMap<InstanceKey, CancellationToken>>,
}

impl HttpProtocolEngine {
    pub fn new(config: SidecarConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            sidecar: SidecarClient {
                client,
                base_url: config.base_url,
            },
            poll_interval: config.poll_interval,
            pollers: Mutex::new(HashMap::new()),
        })
    }

    fn replace_poller(&self, instance: &InstanceKey) -> CancellationToken {
        let token = CancellationToken::new();
        let mut pollers = match self.pollers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(old) = pollers.insert(instance.clone(), token.clone()) {
            old.cancel();
        }
        token
    }

    fn stop_poller(&self, instance: &InstanceKey) {
        let mut pollers = match self.pollers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(token) = pollers.remove(instance) {
            token.cancel();
        }
    }
}

async fn poll_status(
    sidecar: SidecarClient,
    instance: InstanceKey,
    interval: Duration,
    token: CancellationToken,
    tx: mpsc::Sender<EngineSignal>,
    mut connected: bool,
    mut last_qr: Option<String>,
) {
    let mut failures = 0u32;
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tx.closed() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let observed = match sidecar.info(&instance).await {
            Ok(info) => {
                failures = 0;
                classify(&info)
            }
            Err(e) => {
                failures += 1;
                debug!(%instance, failures, error = %e, "Status poll failed");
                if failures < MAX_POLL_FAILURES {
                    continue;
                }
                Observed::Gone {
                    logged_out: false,
                    reason: e.to_string(),
                }
            }
        };

        let signal = match observed {
            Observed::Connected if !connected => {
                connected = true;
                EngineSignal::Opened
            }
            Observed::Connected => continue,
            Observed::Pending(Some(code)) if last_qr.as_deref() != Some(code.as_str()) => {
                last_qr = Some(code.clone());
                EngineSignal::QrCode(code)
            }
            Observed::Pending(_) => continue,
            Observed::Gone { logged_out, reason }
                if connected || logged_out || failures >= MAX_POLL_FAILURES =>
            {
                let _ = tx.send(EngineSignal::Closed { logged_out, reason }).await;
                break;
            }
            Observed::Gone { .. } => continue,
        };

        if tx.send(signal).await.is_err() {
            break;
        }
    }
    debug!(%instance, "Status poller stopped");
}

#[async_trait]
impl ProtocolEngine for HttpProtocolEngine {
    async fn connect(&self, instance: &InstanceKey) -> Result<EngineSession, EngineError> {
        let body = self
            .sidecar
            .post("/session/start", &json!({ "instance": instance }))
            .await?;
        let outcome = interpret_start(parse_start(body)?)?;

        let (tx, rx) = mpsc::channel(SIGNAL_BUFFER);
        let (restored, first_qr) = match outcome {
            StartOutcome::Restored => (true, None),
            StartOutcome::Qr(code) => (false, code),
        };
        if let Some(code) = &first_qr {
            let _ = tx.try_send(EngineSignal::QrCode(code.clone()));
        }

        let token = self.replace_poller(instance);
        tokio::spawn(poll_status(
            self.sidecar.clone(),
            instance.clone(),
            self.poll_interval,
            token,
            tx,
            restored,
            first_qr,
        ));

        debug!(%instance, restored, "Sidecar session started");
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
        let (path, body) = send_request(instance, to, message, options);
        let response = self.sidecar.post(path, &body).await?;
        Ok(message_id_from(&response))
    }

    async fn pair_by_phone(
        &self,
        instance: &InstanceKey,
        phone: &str,
    ) -> Result<String, EngineError> {
        let response = self
            .sidecar
            .post(
                "/session/pair-code",
                &json!({ "instance": instance, "phoneNumber": phone }),
            )
            .await?;
        if let Some(error) = response.get("error").and_then(Value::as_str).filter(|e| !e.is_empty()) {
            return Err(EngineError::Rejected(error.to_string()));
        }
        response
            .get("code")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .ok_or_else(|| EngineError::Rejected("Sidecar returned no pairing code".to_string()))
    }

    /// Stops observing the session. The sidecar has no close endpoint that
    /// keeps credentials, so its socket is left to its own lifecycle.
    async fn disconnect(&self, instance: &InstanceKey) -> Result<(), EngineError> {
        self.stop_poller(instance);
        Ok(())
    }

    async fn logout(&self, instance: &InstanceKey) -> Result<(), EngineError> {
        self.stop_poller(instance);
        if let Err(e) = self
            .sidecar
            .post("/session/logout", &json!({ "instance": instance }))
            .await
        {
            warn!(%instance, error = %e, "Sidecar logout failed");
            return Err(e);
        }
        Ok(())
    }

    async fn create_group(
        &self,
        instance: &InstanceKey,
        group: &NewGroup,
    ) -> Result<String, EngineError> {
        let response = self
            .sidecar
            .post(
                "/v1/group/create",
                &json!({
                    "instance": instance,
                    "subject": group.subject,
                    "participants": group.participants,
                    "description": group.description,
                }),
            )
            .await?;
        group_id_from(&reject_error_field(response)?)
    }

    async fn group_action(
        &self,
        instance: &InstanceKey,
        group_id: &str,
        participants: &[String],
        action: GroupAction,
    ) -> Result<(), EngineError> {
        let response = self
            .sidecar
            .post(
                "/v1/group/participants",
                &json!({
                    "instance": instance,
                    "groupId": group_id,
                    "participants": participants,
                    "action": action,
                }),
            )
            .await?;
        reject_error_field(response).map(|_| ())
    }

    /// The sidecar only lists every contact; filtering happens here.
    async fn search_contacts(
        &self,
        instance: &InstanceKey,
        query: &str,
    ) -> Result<Vec<Contact>, EngineError> {
        let response = self.sidecar.get(&format!("/v1/contacts/{}", instance)).await?;
        let contacts = contacts_from(reject_error_field(response)?)?;
        Ok(contacts.into_iter().filter(|c| c.matches(query)).collect())
    }

    async fn trigger_sync(&self, instance: &InstanceKey) -> Result<(), EngineError> {
        let response = self
            .sidecar
            .post(&format!("/v1/instance/{}/sync", instance), &json!({}))
            .await?;
        reject_error_field(response).map(|_| ())
    }

    async fn sync_status(&self, instance: &InstanceKey) -> Result<SyncStatus, EngineError> {
        let response = self
            .sidecar
            .get(&format!("/v1/instance/{}/sync-status", instance))
            .await?;
        sync_status_from(reject_error_field(response)?)
    }
}
