//! Messaging domain module.
//!
//! Turns the generic outbound-message request accepted over HTTP into one
//! typed [`OutboundMessage`] the protocol engine knows how to send.

mod errors;
mod native_flow;
mod outbound;
mod request;

pub use errors::DispatchError;
pub use native_flow::{InteractiveHeader, NativeAction, NativeButton, NativeFlowMessage};
pub use outbound::{DispatchOutcome, MessageKind, OutboundMessage};
pub use request::{
    DeliveryOptions, InteractiveAction, InteractiveHeaderInput, InteractivePayload, ListRow,
    ListSection, MediaPayload, QuickReplyButton, RawNativeButton, SendMessageRequest, TextBlock,
};
