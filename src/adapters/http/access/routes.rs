//! HTTP routes for identity and API-key endpoints.

use axum::{
    routing::{get, put},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{issue_api_key, list_api_keys, me, revoke_api_key, update_api_key};

/// Routes mounted under `/v1`.
///
/// - `GET /me` - Any valid key
/// - `GET|POST /api-keys` - super_admin
/// - `PUT|DELETE /api-keys/:id` - super_admin
pub fn access_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/api-keys", get(list_api_keys).post(issue_api_key))
        .route("/api-keys/:id", put(update_api_key).delete(revoke_api_key))
}
