//! Event bus adapters.
//!
//! - `FanoutEventBus` - production bus with bounded per-listener queues
//! - `InMemoryEventBus` - recording publisher for tests
//! - `WebhookNotifier` - listener that POSTs events to a configured URL

mod fanout;
mod in_memory;
mod webhook_notifier;

pub use fanout::{FanoutEventBus, DEFAULT_QUEUE_CAPACITY};
pub use in_memory::InMemoryEventBus;
pub use webhook_notifier::{
    sign as sign_webhook_body, WebhookNotifier, WebhookNotifierConfig, EVENT_HEADER,
    SIGNATURE_HEADER,
};
