//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the gateway core to external systems:
//! - `engine` - protocol engine (HTTP sidecar, scripted mock)
//! - `events` - event bus implementations and the webhook listener
//! - `http` - axum REST API
//! - `memory` - in-process storage adapters
//! - `postgres` - PostgreSQL storage adapters

pub mod engine;
pub mod events;
pub mod http;
pub mod memory;
pub mod postgres;
