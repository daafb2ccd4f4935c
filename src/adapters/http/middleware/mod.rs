//! HTTP middleware for axum.
//!
//! - `auth` - API-key authentication middleware and principal extractors

pub mod auth;

pub use auth::{
    api_key_middleware, extract_credential, AuthRejection, RequirePrincipal, RequireSuperAdmin,
    API_KEY_HEADERS,
};
