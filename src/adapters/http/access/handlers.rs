//! HTTP handlers for the caller identity and API-key administration.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{RequirePrincipal, RequireSuperAdmin};
use crate::adapters::http::state::AppState;
use crate::application::handlers::{IssueApiKeyCommand, RevokeApiKeyCommand, UpdateApiKeyCommand};
use crate::domain::foundation::{PrincipalId, ValidationError};

use super::dto::{
    ApiKeyListResponse, IssueApiKeyRequest, IssueApiKeyResponse, PrincipalResponse,
    UpdateApiKeyRequest,
};

fn parse_id(raw: &str) -> Result<PrincipalId, ApiError> {
    raw.parse::<PrincipalId>().map_err(|_| {
        ValidationError::invalid_format("id", format!("'{}' is not a key id", raw)).into()
    })
}

/// GET /v1/me - The caller's own principal
pub async fn me(RequirePrincipal(principal): RequirePrincipal) -> impl IntoResponse {
    Json(PrincipalResponse::from(principal))
}

/// GET /v1/api-keys - Every key, newest first
pub async fn list_api_keys(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let keys: Vec<PrincipalResponse> = state
        .list_api_keys_handler()
        .handle()
        .await?
        .into_iter()
        .map(PrincipalResponse::from)
        .collect();

    Ok(Json(ApiKeyListResponse {
        total: keys.len(),
        keys,
    }))
}

/// POST /v1/api-keys - Issue a key; the raw value is returned only here
pub async fn issue_api_key(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Json(req): Json<IssueApiKeyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = IssueApiKeyCommand {
        name: req.name,
        kind: req.kind,
        allowed_instances: req.allowed_instances,
        validity: req.validity.map(|v| v.into_selector()),
    };

    let result = state.issue_api_key_handler().handle(cmd).await?;
    tracing::info!(
        principal_id = %result.principal.id,
        issued_by = %admin.id,
        "API key issued over HTTP"
    );

    let response = IssueApiKeyResponse {
        api_key: result.raw_key,
        key: result.principal.into(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT /v1/api-keys/:id - Partial update
pub async fn update_api_key(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Path(id): Path<String>,
    Json(req): Json<UpdateApiKeyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = UpdateApiKeyCommand {
        id: parse_id(&id)?,
        name: req.name,
        active: req.active,
        kind: req.kind,
        allowed_instances: req.allowed_instances,
        renew_validity: req.renew_validity.map(|v| v.into_selector()),
    };

    let principal = state.update_api_key_handler().handle(cmd).await?;
    Ok(Json(PrincipalResponse::from(principal)))
}

/// DELETE /v1/api-keys/:id - Revoke a key other than the caller's own
pub async fn revoke_api_key(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = RevokeApiKeyCommand {
        id: parse_id(&id)?,
        requested_by: admin.id,
    };

    state.revoke_api_key_handler().handle(cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_id_is_bad_request() {
        let err = parse_id("abc").unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn numeric_id_parses() {
        assert_eq!(parse_id("42").unwrap(), PrincipalId::new(42));
    }
}
