//! HTTP adapter - the gateway's REST API.
//!
//! - `access` - caller identity and API-key administration
//! - `instances` - registration, session lifecycle and mirror reads
//! - `messaging` - outbound messages
//! - `middleware` - API-key authentication
//!
//! `build_router` assembles all of them behind the shared layers.

pub mod access;
pub mod error;
pub mod instances;
pub mod messaging;
pub mod middleware;
mod router;
mod state;

pub use error::{ApiError, ErrorResponse};
pub use router::{build_router, health, v1_routes, HealthResponse};
pub use state::AppState;
