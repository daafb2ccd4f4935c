//! Generic outbound-message request as it arrives over the wire.
//!
//! One envelope carries every message kind; which payload fields must be
//! present depends on the type tag.

use serde::{Deserialize, Serialize};

/// Envelope shared by every message kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Recipient phone number or chat id.
    pub number: String,

    /// Type tag; set from the route when absent from the body.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media: Option<MediaPayload>,
    #[serde(default)]
    pub interactive: Option<InteractivePayload>,

    // Shared by buttons, list, url-button and copy-button.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default)]
    pub button_text: Option<String>,

    #[serde(default)]
    pub buttons: Option<Vec<QuickReplyButton>>,
    #[serde(default)]
    pub sections: Option<Vec<ListSection>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub copy_code: Option<String>,

    #[serde(default)]
    pub options: DeliveryOptions,
}

/// How and when a message is delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOptions {
    /// Seconds to wait before sending. Zero sends immediately.
    #[serde(default)]
    pub delay: u64,
    #[serde(default, alias = "replyTo", skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, alias = "isForward")]
    pub is_forward: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPayload {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// image, video, audio or document.
    #[serde(rename = "type")]
    pub media_type: String,
}

/// Fully structured interactive message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InteractivePayload {
    #[serde(default)]
    pub header: Option<InteractiveHeaderInput>,
    #[serde(default)]
    pub body: Option<TextBlock>,
    #[serde(default)]
    pub footer: Option<TextBlock>,
    #[serde(default)]
    pub action: Option<InteractiveAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InteractiveHeaderInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub has_media: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InteractiveAction {
    /// Label of the list opener button.
    #[serde(default)]
    pub button: Option<String>,
    #[serde(default)]
    pub buttons: Vec<RawNativeButton>,
    #[serde(default)]
    pub sections: Vec<ListSection>,
}

/// Pre-built native button passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawNativeButton {
    pub name: String,
    #[serde(rename = "buttonParamsJson")]
    pub button_params_json: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuickReplyButton {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "displayText", alias = "title")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub rows: Vec<ListRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRow {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_request_deserializes_with_options() {
        let req: SendMessageRequest = serde_json::from_str(
            r#"{"number":"5511999","text":"hi","options":{"delay":3,"replyTo":"ABC","is_forward":true}}"#,
        )
        .unwrap();

        assert_eq!(req.text.as_deref(), Some("hi"));
        assert_eq!(req.options.delay, 3);
        assert_eq!(req.options.reply_to.as_deref(), Some("ABC"));
        assert!(req.options.is_forward);
    }

    #[test]
    fn options_default_to_immediate() {
        let req: SendMessageRequest = serde_json::from_str(r#"{"number":"1"}"#).unwrap();
        assert_eq!(req.options, DeliveryOptions::default());
    }

    #[test]
    fn interactive_payload_accepts_native_button_field_name() {
        let req: SendMessageRequest = serde_json::from_str(
            r#"{"number":"1","interactive":{"body":{"text":"b"},"action":{"buttons":[{"name":"quick_reply","buttonParamsJson":"{}"}]}}}"#,
        )
        .unwrap();

        let action = req.interactive.unwrap().action.unwrap();
        assert_eq!(action.buttons[0].name, "quick_reply");
    }
}
