//! Gateway events.
//!
//! Immutable records of something observable happening to an instance:
//! - `connection.update` - connection state changed
//! - `qr.update` - a new pairing code is available
//! - `message.received` - an inbound message arrived
//! - `message.receipt` - a delivery/read receipt arrived

mod event;

pub use event::{EventKind, GatewayEvent};
