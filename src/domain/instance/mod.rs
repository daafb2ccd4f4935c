//! Instance domain module.
//!
//! An instance is one linked account on the messaging network. This module
//! holds its connection state machine, the outcomes of a connect request and
//! the errors the session lifecycle can produce.

mod errors;
mod state;

pub use errors::SessionError;
pub use state::{ConnectOutcome, ConnectionState, InstanceInfo};
