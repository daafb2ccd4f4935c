//! Outbound message dispatch.

mod dispatch_message;

pub use dispatch_message::{DispatchMessageCommand, MessageDispatcher};
