//! Group creation and membership changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Membership change applied to a set of group participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupAction {
    Add,
    Remove,
    Promote,
    Demote,
}

impl GroupAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupAction::Add => "add",
            GroupAction::Remove => "remove",
            GroupAction::Promote => "promote",
            GroupAction::Demote => "demote",
        }
    }
}

impl fmt::Display for GroupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(GroupAction::Add),
            "remove" => Ok(GroupAction::Remove),
            "promote" => Ok(GroupAction::Promote),
            "demote" => Ok(GroupAction::Demote),
            "" => Err(ValidationError::empty_field("action")),
            other => Err(ValidationError::invalid_format(
                "action",
                format!("'{}' is not one of add, remove, promote, demote", other),
            )),
        }
    }
}

/// Trims participant ids, drops blanks and repeats, keeps first-seen order.
///
/// # Errors
///
/// `EmptyField` when nothing is left.
pub fn normalize_participants(raw: Vec<String>) -> Result<Vec<String>, ValidationError> {
    let mut participants: Vec<String> = Vec::with_capacity(raw.len());
    for p in raw {
        let p = p.trim();
        if !p.is_empty() && !participants.iter().any(|seen| seen == p) {
            participants.push(p.to_string());
        }
    }
    if participants.is_empty() {
        return Err(ValidationError::empty_field("participants"));
    }
    Ok(participants)
}

/// A validated group creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub subject: String,
    pub participants: Vec<String>,
    pub description: Option<String>,
}

impl NewGroup {
    pub const MAX_SUBJECT_LENGTH: usize = 100;

    pub fn new(
        subject: &str,
        participants: Vec<String>,
        description: Option<String>,
    ) -> Result<Self, ValidationError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(ValidationError::empty_field("subject"));
        }
        let length = subject.chars().count();
        if length > Self::MAX_SUBJECT_LENGTH {
            return Err(ValidationError::too_long(
                "subject",
                Self::MAX_SUBJECT_LENGTH,
                length,
            ));
        }

        Ok(Self {
            subject: subject.to_string(),
            participants: normalize_participants(participants)?,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn action_parses_case_insensitively() {
        assert_eq!("ADD".parse::<GroupAction>().unwrap(), GroupAction::Add);
        assert_eq!(" demote ".parse::<GroupAction>().unwrap(), GroupAction::Demote);
        assert_eq!(GroupAction::Promote.to_string(), "promote");
    }

    #[test]
    fn unknown_or_blank_action_is_rejected() {
        assert!(matches!(
            "kick".parse::<GroupAction>(),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            "".parse::<GroupAction>(),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn participants_are_trimmed_and_deduplicated() {
        let list = normalize_participants(ids(&[" 5511@s.whatsapp.net", "", "5511@s.whatsapp.net", "5522"]))
            .unwrap();
        assert_eq!(list, ids(&["5511@s.whatsapp.net", "5522"]));

        assert!(normalize_participants(ids(&["  "])).is_err());
    }

    #[test]
    fn new_group_requires_subject_and_members() {
        let group = NewGroup::new(" Sales ", ids(&["5511"]), Some("  ".into())).unwrap();
        assert_eq!(group.subject, "Sales");
        assert_eq!(group.description, None);

        assert!(matches!(
            NewGroup::new("  ", ids(&["5511"]), None),
            Err(ValidationError::EmptyField { ref field }) if field == "subject"
        ));
        assert!(matches!(
            NewGroup::new("Sales", vec![], None),
            Err(ValidationError::EmptyField { ref field }) if field == "participants"
        ));
    }

    #[test]
    fn long_subject_is_rejected() {
        let subject = "x".repeat(NewGroup::MAX_SUBJECT_LENGTH + 1);
        assert!(matches!(
            NewGroup::new(&subject, ids(&["5511"]), None),
            Err(ValidationError::TooLong { .. })
        ));
    }
}
