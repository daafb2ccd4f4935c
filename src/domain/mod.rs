//! Domain layer - Pure business logic with no I/O.
//!
//! - `foundation` - shared value objects, ids and errors
//! - `access` - API-key principals and authorization rules
//! - `directory` - group administration and engine contact lists
//! - `instance` - connection state machine and session lifecycle errors
//! - `events` - immutable gateway events
//! - `messaging` - outbound message resolution and native-flow building

pub mod access;
pub mod directory;
pub mod events;
pub mod foundation;
pub mod instance;
pub mod messaging;
