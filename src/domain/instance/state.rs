//! Connection state machine for a single instance.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{InstanceKey, PrincipalId, StateMachine, Timestamp};

/// Where one instance's engine connection currently stands.
///
/// ```text
///  Disconnected ──► AwaitingQr ──► Connected
///       │  ▲            │              │
///       │  └────────────┘              │ protocol disconnect
///       ├─────────────────────────► ◄──┘
///       ▼                  (restored credentials)
///  Reconnecting ──► AwaitingQr | Connected | Disconnected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    AwaitingQr,
    Connected,
    Reconnecting,
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::AwaitingQr => "awaiting_qr",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Disconnected, AwaitingQr)
                | (Disconnected, Connected)
                | (Disconnected, Reconnecting)
                | (AwaitingQr, Connected)
                | (AwaitingQr, Disconnected)
                | (Connected, Disconnected)
                | (Reconnecting, AwaitingQr)
                | (Reconnecting, Connected)
                | (Reconnecting, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Disconnected => vec![AwaitingQr, Connected, Reconnecting],
            AwaitingQr => vec![Connected, Disconnected],
            Connected => vec![Disconnected],
            Reconnecting => vec![AwaitingQr, Connected, Disconnected],
        }
    }
}

/// Result of a successful `connect` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Instance was already connected; nothing was done.
    AlreadyConnected,
    /// Persisted credentials were accepted; no QR code needed.
    SessionRestored,
    /// A fresh pairing code to present to the mobile client.
    QrCode(String),
}

impl ConnectOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            ConnectOutcome::AlreadyConnected => "already_connected",
            ConnectOutcome::SessionRestored => "session_restored",
            ConnectOutcome::QrCode(_) => "qrcode",
        }
    }
}

/// Point-in-time view of a registered instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceInfo {
    pub instance: InstanceKey,
    pub state: ConnectionState,
    pub created_at: Timestamp,
    pub owner: Option<PrincipalId>,
    pub messages_sent: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    const ALL: [ConnectionState; 4] = [Disconnected, AwaitingQr, Connected, Reconnecting];

    #[test]
    fn initial_state_is_disconnected() {
        assert_eq!(ConnectionState::default(), Disconnected);
    }

    #[test]
    fn pairing_path_is_valid() {
        let s = Disconnected.transition_to(AwaitingQr).unwrap();
        let s = s.transition_to(Connected).unwrap();
        assert_eq!(s, Connected);
    }

    #[test]
    fn restored_credentials_go_straight_to_connected() {
        assert!(Disconnected.can_transition_to(&Connected));
    }

    #[test]
    fn disconnect_then_reconnect_path_is_valid() {
        let s = Connected.transition_to(Disconnected).unwrap();
        let s = s.transition_to(Reconnecting).unwrap();
        assert!(s.can_transition_to(&AwaitingQr));
        assert!(s.can_transition_to(&Connected));
    }

    #[test]
    fn connected_cannot_jump_back_to_awaiting_qr() {
        assert!(Connected.transition_to(AwaitingQr).is_err());
        assert!(Connected.transition_to(Reconnecting).is_err());
    }

    #[test]
    fn no_state_is_terminal() {
        for state in ALL {
            assert!(!state.is_terminal(), "{:?} should have exits", state);
        }
    }

    #[test]
    fn valid_transitions_agree_with_can_transition_to() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn state_serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&AwaitingQr).unwrap(), "\"awaiting_qr\"");
    }

    #[test]
    fn connect_outcome_status_strings() {
        assert_eq!(ConnectOutcome::AlreadyConnected.status(), "already_connected");
        assert_eq!(ConnectOutcome::SessionRestored.status(), "session_restored");
        assert_eq!(ConnectOutcome::QrCode("x".into()).status(), "qrcode");
    }
}
