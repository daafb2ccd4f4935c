//! HTTP handler for outbound messages.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequirePrincipal;
use crate::adapters::http::state::AppState;
use crate::application::handlers::{AccessGate, DispatchMessageCommand};
use crate::domain::foundation::InstanceKey;
use crate::domain::messaging::{DispatchError, DispatchOutcome, MessageKind, SendMessageRequest};

use super::dto::SendMessageResponse;

/// POST /v1/message/:instance/:kind - Send or schedule one message
///
/// Scope is checked first, then the type tag, then the body; a body that
/// does not parse is reported as `invalid_payload`.
pub async fn send_message(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path((instance, kind)): Path<(String, String)>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = InstanceKey::new(&instance)?;
    AccessGate::authorize(&principal, &instance)?;

    kind.parse::<MessageKind>()?;
    let Json(request) =
        body.map_err(|rejection| DispatchError::invalid_payload(rejection.body_text()))?;

    let cmd = DispatchMessageCommand {
        instance,
        kind,
        request,
    };

    let outcome = state.dispatcher.handle(cmd).await?;
    let status = match outcome {
        DispatchOutcome::Sent(_) => StatusCode::OK,
        DispatchOutcome::Scheduled { .. } => StatusCode::ACCEPTED,
    };
    Ok((status, Json(SendMessageResponse::from(outcome))))
}
