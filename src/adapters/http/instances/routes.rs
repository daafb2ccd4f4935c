//! HTTP routes for instance endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{
    connect, contacts, create_group, delete_instance, groups, info, list_instances, logout,
    messages, pair, register_instance, search_contacts, stats, sync_status, trigger_sync,
    update_group_participants,
};

/// Routes mounted under `/v1`.
///
/// ## Registration
/// - `GET /instances` - Scoped to the caller
/// - `POST /instances`, `DELETE /instances/:name` - super_admin
///
/// ## Per instance (caller must be allowed on `:key`)
/// - `POST /instance/:key/connect|logout|pair`
/// - `GET /instance/:key/info|contacts|groups|stats`
/// - `GET /instance/:key/messages/:jid`
///
/// ## Live session (409 `not_connected` unless connected)
/// - `POST /instance/:key/groups`
/// - `PUT /instance/:key/groups/:group_id/participants?action=`
/// - `GET /instance/:key/contacts/search?q=`
/// - `POST /instance/:key/sync`, `GET /instance/:key/sync-status`
pub fn instance_routes() -> Router<AppState> {
    Router::new()
        .route("/instances", get(list_instances).post(register_instance))
        .route("/instances/:name", delete(delete_instance))
        .route("/instance/:key/connect", post(connect))
        .route("/instance/:key/logout", post(logout))
        .route("/instance/:key/info", get(info))
        .route("/instance/:key/pair", post(pair))
        .route("/instance/:key/contacts", get(contacts))
        .route("/instance/:key/contacts/search", get(search_contacts))
        .route("/instance/:key/groups", get(groups).post(create_group))
        .route(
            "/instance/:key/groups/:group_id/participants",
            put(update_group_participants),
        )
        .route("/instance/:key/sync", post(trigger_sync))
        .route("/instance/:key/sync-status", get(sync_status))
        .route("/instance/:key/stats", get(stats))
        .route("/instance/:key/messages/:jid", get(messages))
}
