//! HTTP routes for outbound messages.

use axum::{routing::post, Router};

use crate::adapters::http::state::AppState;

use super::handlers::send_message;

/// `POST /message/:instance/:kind`, mounted under `/v1`.
///
/// `kind` is one of `text`, `media`, `interactive`, `buttons`, `list`,
/// `url-button` or `copy-button`.
pub fn message_routes() -> Router<AppState> {
    Router::new().route("/message/:instance/:kind", post(send_message))
}
