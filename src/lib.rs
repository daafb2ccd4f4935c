//! Nexus Gateway - multi-tenant gateway for linked messaging-network sessions.
//!
//! The gateway keeps one live session per instance, fans session events out
//! to subscribers, gates every request behind scoped API keys and dispatches
//! outbound messages through a protocol engine.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
