//! Native-flow interactive messages.
//!
//! Buttons, lists and call-to-action messages all travel as one interactive
//! message whose action carries named native buttons with JSON-encoded
//! parameters.

use serde::Serialize;
use serde_json::json;

use super::request::{InteractivePayload, ListSection, QuickReplyButton, TextBlock};

pub const QUICK_REPLY: &str = "quick_reply";
pub const SINGLE_SELECT: &str = "single_select";
pub const CTA_URL: &str = "cta_url";
pub const CTA_COPY: &str = "cta_copy";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InteractiveHeader {
    pub title: String,
    pub subtitle: String,
    pub has_media: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeButton {
    pub name: String,
    #[serde(rename = "buttonParamsJson")]
    pub button_params_json: String,
}

impl NativeButton {
    fn new(name: &str, params: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            button_params_json: params.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NativeAction {
    pub buttons: Vec<NativeButton>,
}

/// Interactive message in the shape the engine relays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NativeFlowMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<InteractiveHeader>,
    pub body: TextBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<TextBlock>,
    pub action: NativeAction,
}

/// Text fields shared by every button-style message.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub title: Option<String>,
    pub body: String,
    pub footer: Option<String>,
}

impl NativeFlowMessage {
    fn framed(frame: Frame, buttons: Vec<NativeButton>) -> Self {
        Self {
            header: frame.title.map(|title| InteractiveHeader {
                title,
                ..Default::default()
            }),
            body: TextBlock { text: frame.body },
            footer: frame.footer.map(|text| TextBlock { text }),
            action: NativeAction { buttons },
        }
    }

    /// Structured interactive payload. Pre-built buttons pass through, list
    /// sections become one `single_select` button. An action with neither
    /// yields an empty action.
    pub fn from_interactive(payload: &InteractivePayload) -> Self {
        let mut buttons: Vec<NativeButton> = Vec::new();
        if let Some(action) = &payload.action {
            buttons.extend(action.buttons.iter().map(|b| NativeButton {
                name: b.name.clone(),
                button_params_json: b.button_params_json.clone(),
            }));
            if !action.sections.is_empty() {
                let label = action.button.clone().unwrap_or_else(|| "Select".to_string());
                buttons.push(single_select_button(&label, &action.sections));
            }
        }

        Self {
            header: payload.header.as_ref().map(|h| InteractiveHeader {
                title: h.title.clone(),
                subtitle: h.subtitle.clone(),
                has_media: h.has_media,
            }),
            body: payload.body.clone().unwrap_or_default(),
            footer: payload.footer.clone(),
            action: NativeAction { buttons },
        }
    }

    pub fn quick_replies(frame: Frame, buttons: &[QuickReplyButton]) -> Self {
        let buttons = buttons
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let id = b.id.clone().unwrap_or_else(|| format!("btn_{}", i + 1));
                NativeButton::new(QUICK_REPLY, json!({ "display_text": b.text, "id": id }))
            })
            .collect();
        Self::framed(frame, buttons)
    }

    pub fn single_select(frame: Frame, button_text: &str, sections: &[ListSection]) -> Self {
        Self::framed(frame, vec![single_select_button(button_text, sections)])
    }

    pub fn cta_url(frame: Frame, button_text: &str, url: &str) -> Self {
        let button = NativeButton::new(
            CTA_URL,
            json!({ "display_text": button_text, "url": url, "merchant_url": url }),
        );
        Self::framed(frame, vec![button])
    }

    pub fn cta_copy(frame: Frame, button_text: &str, copy_code: &str) -> Self {
        let button = NativeButton::new(
            CTA_COPY,
            json!({ "display_text": button_text, "copy_code": copy_code }),
        );
        Self::framed(frame, vec![button])
    }
}

fn single_select_button(label: &str, sections: &[ListSection]) -> NativeButton {
    let sections: Vec<_> = sections
        .iter()
        .enumerate()
        .map(|(s, section)| {
            let rows: Vec<_> = section
                .rows
                .iter()
                .enumerate()
                .map(|(r, row)| {
                    let id = if row.id.is_empty() {
                        format!("row_{}_{}", s + 1, r + 1)
                    } else {
                        row.id.clone()
                    };
                    json!({ "id": id, "title": row.title, "description": row.description })
                })
                .collect();
            json!({ "title": section.title, "rows": rows })
        })
        .collect();

    NativeButton::new(SINGLE_SELECT, json!({ "title": label, "sections": sections }))
}
