//! Resolution of a generic request into one typed outbound message.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::native_flow::{Frame, NativeFlowMessage};
use super::request::{MediaPayload, SendMessageRequest};
use super::DispatchError;
use crate::domain::foundation::{DeliveryId, MessageId};

/// Every message kind the gateway can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    Media,
    Interactive,
    Buttons,
    List,
    UrlButton,
    CopyButton,
}

impl MessageKind {
    pub const ALL: [MessageKind; 7] = [
        MessageKind::Text,
        MessageKind::Media,
        MessageKind::Interactive,
        MessageKind::Buttons,
        MessageKind::List,
        MessageKind::UrlButton,
        MessageKind::CopyButton,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Media => "media",
            MessageKind::Interactive => "interactive",
            MessageKind::Buttons => "buttons",
            MessageKind::List => "list",
            MessageKind::UrlButton => "url-button",
            MessageKind::CopyButton => "copy-button",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DispatchError::UnsupportedType(s.to_string()))
    }
}

/// Message ready to hand to the protocol engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text(String),
    Media(MediaPayload),
    NativeFlow(NativeFlowMessage),
}

impl OutboundMessage {
    /// Validates the request against its type tag and builds the message.
    ///
    /// The payload field belonging to the tag must be present and no payload
    /// field belonging to another kind may be set.
    pub fn resolve(kind: MessageKind, req: &SendMessageRequest) -> Result<Self, DispatchError> {
        if req.number.trim().is_empty() {
            return Err(DispatchError::invalid_payload("number is required"));
        }
        if let Some(other) = foreign_payload(kind, req) {
            return Err(DispatchError::invalid_payload(format!(
                "'{}' is not valid for a {} message",
                other, kind
            )));
        }

        match kind {
            MessageKind::Text => req
                .text
                .clone()
                .map(OutboundMessage::Text)
                .ok_or_else(|| DispatchError::invalid_payload("text is required")),
            MessageKind::Media => {
                let media = req
                    .media
                    .clone()
                    .ok_or_else(|| DispatchError::invalid_payload("media is required"))?;
                if media.url.trim().is_empty() {
                    return Err(DispatchError::invalid_payload("media.url is required"));
                }
                Ok(OutboundMessage::Media(media))
            }
            MessageKind::Interactive => req
                .interactive
                .as_ref()
                .map(|p| OutboundMessage::NativeFlow(NativeFlowMessage::from_interactive(p)))
                .ok_or_else(|| DispatchError::invalid_payload("interactive is required")),
            MessageKind::Buttons => {
                let buttons = req
                    .buttons
                    .as_deref()
                    .filter(|b| !b.is_empty())
                    .ok_or_else(|| DispatchError::invalid_payload("buttons are required"))?;
                Ok(OutboundMessage::NativeFlow(NativeFlowMessage::quick_replies(
                    frame(req),
                    buttons,
                )))
            }
            MessageKind::List => {
                let sections = req
                    .sections
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| DispatchError::invalid_payload("sections are required"))?;
                let label = req.button_text.as_deref().unwrap_or("Select");
                Ok(OutboundMessage::NativeFlow(NativeFlowMessage::single_select(
                    frame(req),
                    label,
                    sections,
                )))
            }
            MessageKind::UrlButton => {
                let url = required(&req.url, "url")?;
                let label = req.button_text.as_deref().unwrap_or("Open");
                Ok(OutboundMessage::NativeFlow(NativeFlowMessage::cta_url(
                    frame(req),
                    label,
                    url,
                )))
            }
            MessageKind::CopyButton => {
                let code = required(&req.copy_code, "copyCode")?;
                let label = req.button_text.as_deref().unwrap_or("Copy");
                Ok(OutboundMessage::NativeFlow(NativeFlowMessage::cta_copy(
                    frame(req),
                    label,
                    code,
                )))
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            OutboundMessage::Text(_) => "text",
            OutboundMessage::Media(_) => "media",
            OutboundMessage::NativeFlow(_) => "native_flow",
        }
    }
}

fn frame(req: &SendMessageRequest) -> Frame {
    Frame {
        title: req.title.clone().filter(|t| !t.is_empty()),
        body: req.message.clone().or_else(|| req.text.clone()).unwrap_or_default(),
        footer: req.footer.clone().filter(|f| !f.is_empty()),
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, DispatchError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DispatchError::invalid_payload(format!("{} is required", field)))
}

/// Returns the name of a payload field that belongs to a different kind.
fn foreign_payload(kind: MessageKind, req: &SendMessageRequest) -> Option<&'static str> {
    let owned: [(&'static str, bool, MessageKind); 7] = [
        ("media", req.media.is_some(), MessageKind::Media),
        ("interactive", req.interactive.is_some(), MessageKind::Interactive),
        ("buttons", req.buttons.is_some(), MessageKind::Buttons),
        ("sections", req.sections.is_some(), MessageKind::List),
        ("url", req.url.is_some(), MessageKind::UrlButton),
        ("copyCode", req.copy_code.is_some(), MessageKind::CopyButton),
        (
            "text",
            // Button-style kinds accept `text` as the body.
            req.text.is_some() && matches!(kind, MessageKind::Media | MessageKind::Interactive),
            MessageKind::Text,
        ),
    ];
    owned
        .into_iter()
        .find(|(_, present, owner)| *present && *owner != kind)
        .map(|(name, _, _)| name)
}

/// What happened to a dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Engine accepted the message.
    Sent(MessageId),
    /// Message will be sent after the requested delay.
    Scheduled { delivery_id: DeliveryId, delay_secs: u64 },
}
