//! Protocol engine adapters.
//!
//! - `HttpProtocolEngine` talks to the protocol sidecar over JSON HTTP
//! - `MockProtocolEngine` is scripted for tests

mod http;
mod mock;

pub use http::{HttpProtocolEngine, SidecarConfig};
pub use mock::{ConnectScript, GroupChange, MockProtocolEngine, SentMessage};
