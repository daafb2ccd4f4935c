//! Contacts known to a live session and history sync progress.

use serde::{Deserialize, Serialize};

/// One contact or group chat as the engine reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub jid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_group: bool,
}

impl Contact {
    /// Case-insensitive substring match on name or JID. A blank query
    /// matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.jid.to_lowercase().contains(&query)
    }
}

/// History sync progress of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    #[serde(default)]
    pub syncing: bool,
    #[serde(default)]
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(jid: &str, name: &str) -> Contact {
        Contact {
            jid: jid.into(),
            name: name.into(),
            is_group: false,
        }
    }

    #[test]
    fn matches_name_or_jid_ignoring_case() {
        let maria = contact("5511999990000@s.whatsapp.net", "Maria Souza");
        assert!(maria.matches("maria"));
        assert!(maria.matches("SOUZA"));
        assert!(maria.matches("99999"));
        assert!(!maria.matches("joao"));
    }

    #[test]
    fn blank_query_matches_all() {
        assert!(contact("1@s.whatsapp.net", "").matches("   "));
    }

    #[test]
    fn sidecar_contact_shape_is_accepted() {
        let c: Contact = serde_json::from_str(r#"{"jid":"123@g.us","is_group":true}"#).unwrap();
        assert!(c.is_group);
        assert_eq!(c.name, "");
    }
}
