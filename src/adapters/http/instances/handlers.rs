//! HTTP handlers for instance registration, session lifecycle and mirror reads.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{RequirePrincipal, RequireSuperAdmin};
use crate::adapters::http::state::AppState;
use crate::application::handlers::{AccessGate, DeleteInstanceCommand, RegisterInstanceCommand};
use crate::domain::access::Principal;
use crate::domain::directory::{normalize_participants, GroupAction, NewGroup};
use crate::domain::foundation::{DomainError, ErrorCode, InstanceKey, ValidationError};

use super::dto::{
    ChatListResponse, ConnectResponse, ContactSearchQuery, ContactSearchResponse,
    CreateGroupRequest, CreateGroupResponse, GroupActionQuery, GroupParticipantsRequest,
    InstanceInfoResponse, InstanceListResponse, InstanceRecordResponse, InstanceSummaryResponse,
    LogoutResponse, MessageListResponse, PairRequest, PairResponse, RegisterInstanceRequest,
    StatusResponse,
};

/// Parses the path key and checks the caller may act on it.
fn scoped_instance(principal: &Principal, raw: &str) -> Result<InstanceKey, ApiError> {
    let instance = InstanceKey::new(raw)?;
    AccessGate::authorize(principal, &instance)?;
    Ok(instance)
}

// ════════════════════════════════════════════════════════════════════════════
// Registration (/v1/instances)
// ════════════════════════════════════════════════════════════════════════════

/// GET /v1/instances - Instances visible to the caller
pub async fn list_instances(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
) -> impl IntoResponse {
    let instances: Vec<InstanceSummaryResponse> = state
        .list_instances_handler()
        .handle(&principal)
        .await
        .into_iter()
        .map(InstanceSummaryResponse::from)
        .collect();

    Json(InstanceListResponse {
        total: instances.len(),
        instances,
    })
}

/// POST /v1/instances - Register (or re-register) an instance name
pub async fn register_instance(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Json(req): Json<RegisterInstanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = RegisterInstanceCommand {
        name: req.name,
        owner: Some(admin.id),
    };
    let record = state.register_instance_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(InstanceRecordResponse::from(record))))
}

/// DELETE /v1/instances/:name - Log out and remove all stored data
pub async fn delete_instance(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let name = InstanceKey::new(&name)?;
    let cmd = DeleteInstanceCommand { name: name.clone() };

    if state.delete_instance_handler().handle(cmd).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(DomainError::new(
            ErrorCode::InstanceNotFound,
            format!("Instance '{}' not found", name),
        )
        .into())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session lifecycle (/v1/instance/:key/...)
// ════════════════════════════════════════════════════════════════════════════

/// POST /v1/instance/:key/connect - Bring an instance online
///
/// Suspends until a QR code arrives, the stored session is restored, or the
/// QR deadline passes (408).
pub async fn connect(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    let outcome = state.registry.connect(&instance, Some(principal.id)).await?;
    Ok(Json(ConnectResponse::from(outcome)))
}

/// POST /v1/instance/:key/logout - Idempotent
pub async fn logout(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    let was_registered = state.registry.logout(&instance).await;
    Ok(Json(LogoutResponse {
        status: "logged_out",
        was_registered,
    }))
}

/// GET /v1/instance/:key/info - Connection state and mirror counts
pub async fn info(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    let info = state.registry.info(&instance).await?;
    let stats = state.mirror_queries().stats(&instance).await;
    Ok(Json(InstanceInfoResponse::new(info, stats)))
}

/// POST /v1/instance/:key/pair - Numeric pairing code for a phone number
pub async fn pair(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(key): Path<String>,
    Json(req): Json<PairRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    let code = state
        .registry
        .pair_by_phone(&instance, &req.phone, Some(principal.id))
        .await?;
    Ok(Json(PairResponse {
        status: "success",
        code,
    }))
}

// ════════════════════════════════════════════════════════════════════════════
// Live-session directory (requires a connected instance)
// ════════════════════════════════════════════════════════════════════════════

/// POST /v1/instance/:key/groups - Create a group
pub async fn create_group(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(key): Path<String>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    let group = NewGroup::new(&req.subject, req.participants, req.description)?;
    let group_id = state.registry.create_group(&instance, &group).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateGroupResponse {
            status: "success",
            group_id,
        }),
    ))
}

/// PUT /v1/instance/:key/groups/:group_id/participants?action=add|remove|promote|demote
pub async fn update_group_participants(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path((key, group_id)): Path<(String, String)>,
    Query(query): Query<GroupActionQuery>,
    Json(req): Json<GroupParticipantsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    let action: GroupAction = query.action.as_deref().unwrap_or_default().parse()?;
    let group_id = group_id.trim();
    if group_id.is_empty() {
        return Err(ValidationError::empty_field("group_id").into());
    }
    let participants = normalize_participants(req.participants)?;

    state
        .registry
        .update_group_participants(&instance, group_id, &participants, action)
        .await?;
    Ok(Json(StatusResponse { status: "success" }))
}

/// GET /v1/instance/:key/contacts/search?q= - Contacts of the live session
pub async fn search_contacts(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(key): Path<String>,
    Query(query): Query<ContactSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    let contacts = state.registry.search_contacts(&instance, &query.q).await?;
    Ok(Json(ContactSearchResponse::from(contacts)))
}

/// POST /v1/instance/:key/sync - Start a history sync
pub async fn trigger_sync(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    state.registry.trigger_sync(&instance).await?;
    Ok((StatusCode::ACCEPTED, Json(StatusResponse { status: "started" })))
}

/// GET /v1/instance/:key/sync-status
pub async fn sync_status(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    Ok(Json(state.registry.sync_status(&instance).await?))
}

// ════════════════════════════════════════════════════════════════════════════
// Mirror reads
// ════════════════════════════════════════════════════════════════════════════

/// GET /v1/instance/:key/contacts
pub async fn contacts(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    let chats = state.mirror_queries().contacts(&instance).await;
    Ok(Json(ChatListResponse::from(chats)))
}

/// GET /v1/instance/:key/groups
pub async fn groups(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    let chats = state.mirror_queries().groups(&instance).await;
    Ok(Json(ChatListResponse::from(chats)))
}

/// GET /v1/instance/:key/stats
pub async fn stats(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    Ok(Json(state.mirror_queries().stats(&instance).await))
}

/// GET /v1/instance/:key/messages/:jid - Latest messages of one chat
pub async fn messages(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path((key, jid)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let instance = scoped_instance(&principal, &key)?;
    let messages = state.mirror_queries().messages(&instance, &jid).await;
    Ok(Json(MessageListResponse::from(messages)))
}
