//! In-memory implementation of the MirrorReader port.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, InstanceKey, Timestamp};
use crate::ports::{MirrorReader, MirrorStats, MirroredChat, MirroredMessage};

#[derive(Default)]
struct Mirror {
    contacts: Vec<MirroredChat>,
    groups: Vec<MirroredChat>,
    messages: HashMap<String, Vec<MirroredMessage>>,
}

/// Mirrored data seeded by tests.
#[derive(Default)]
pub struct InMemoryMirrorReader {
    data: Mutex<HashMap<InstanceKey, Mirror>>,
    fail: bool,
}

impl InMemoryMirrorReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn add_contact(&self, instance: &InstanceKey, jid: &str, name: &str) {
        self.data
            .lock()
            .unwrap()
            .entry(instance.clone())
            .or_default()
            .contacts
            .push(chat(jid, name));
    }

    pub fn add_group(&self, instance: &InstanceKey, jid: &str, name: &str) {
        self.data
            .lock()
            .unwrap()
            .entry(instance.clone())
            .or_default()
            .groups
            .push(chat(jid, name));
    }

    pub fn add_message(&self, instance: &InstanceKey, jid: &str, kind: &str, content: &str) {
        let mut data = self.data.lock().unwrap();
        let messages = data
            .entry(instance.clone())
            .or_default()
            .messages
            .entry(jid.to_string())
            .or_default();
        let id = messages.len() as i64 + 1;
        messages.push(MirroredMessage {
            id,
            kind: kind.to_string(),
            content: content.to_string(),
            created_at: Timestamp::now(),
        });
    }

    /// Drops everything mirrored for `instance`.
    pub fn purge(&self, instance: &InstanceKey) {
        self.data.lock().unwrap().remove(instance);
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.fail {
            return Err(DomainError::database("Simulated mirror failure"));
        }
        Ok(())
    }
}

fn chat(jid: &str, name: &str) -> MirroredChat {
    MirroredChat {
        jid: jid.to_string(),
        name: name.to_string(),
        created_at: Timestamp::now(),
    }
}

fn sorted_by_name(mut chats: Vec<MirroredChat>) -> Vec<MirroredChat> {
    chats.sort_by(|a, b| a.name.cmp(&b.name));
    chats
}

#[async_trait]
impl MirrorReader for InMemoryMirrorReader {
    async fn contacts(&self, instance: &InstanceKey) -> Result<Vec<MirroredChat>, DomainError> {
        self.check()?;
        let data = self.data.lock().unwrap();
        Ok(sorted_by_name(
            data.get(instance).map(|m| m.contacts.clone()).unwrap_or_default(),
        ))
    }

    async fn groups(&self, instance: &InstanceKey) -> Result<Vec<MirroredChat>, DomainError> {
        self.check()?;
        let data = self.data.lock().unwrap();
        Ok(sorted_by_name(
            data.get(instance).map(|m| m.groups.clone()).unwrap_or_default(),
        ))
    }

    async fn messages(
        &self,
        instance: &InstanceKey,
        jid: &str,
        limit: i64,
    ) -> Result<Vec<MirroredMessage>, DomainError> {
        self.check()?;
        let data = self.data.lock().unwrap();
        let mut messages = data
            .get(instance)
            .and_then(|m| m.messages.get(jid))
            .cloned()
            .unwrap_or_default();
        messages.reverse();
        messages.truncate(limit.max(0) as usize);
        Ok(messages)
    }

    async fn stats(&self, instance: &InstanceKey) -> Result<MirrorStats, DomainError> {
        self.check()?;
        let data = self.data.lock().unwrap();
        Ok(data
            .get(instance)
            .map(|m| MirrorStats {
                contacts: m.contacts.len() as i64,
                groups: m.groups.len() as i64,
                messages: m.messages.values().map(|v| v.len() as i64).sum(),
            })
            .unwrap_or_default())
    }
}
