//! Foundation module - Shared domain primitives.
//!
//! Value objects, identifiers and error types shared by every part of the
//! gateway: access control, sessions, messaging and events.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{DeliveryId, EventId, InstanceKey, MessageId, PrincipalId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
