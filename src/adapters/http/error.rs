//! Mapping of gateway errors onto HTTP responses.
//!
//! Every failure leaves the gateway as `{code, message}` JSON with a status
//! chosen from the error's variant.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::access::{ApiKeyError, AuthError, AuthzError};
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::domain::instance::SessionError;
use crate::domain::messaging::DispatchError;

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Any error a gateway endpoint can return.
#[derive(Debug, Clone)]
pub enum ApiError {
    Auth(AuthError),
    Authz(AuthzError),
    ApiKey(ApiKeyError),
    Session(SessionError),
    Dispatch(DispatchError),
    Validation(ValidationError),
    Domain(DomainError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, String) {
        match self {
            ApiError::Auth(AuthError::Unavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "auth_unavailable".into())
            }
            ApiError::Auth(e) => (StatusCode::UNAUTHORIZED, e.code().into()),
            ApiError::Authz(e) => (StatusCode::FORBIDDEN, e.code().into()),
            ApiError::ApiKey(e) => match e {
                ApiKeyError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed".into()),
                ApiKeyError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found".into()),
                ApiKeyError::CannotRevokeSelf => {
                    (StatusCode::FORBIDDEN, "cannot_revoke_self".into())
                }
                ApiKeyError::Storage(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "storage_error".into())
                }
            },
            ApiError::Session(e) => {
                let status = match e {
                    SessionError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
                    SessionError::NotFound(_) => StatusCode::NOT_FOUND,
                    SessionError::PairingFailed(_) | SessionError::EngineFailed(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    SessionError::NotConnected(_)
                    | SessionError::AlreadyConnected(_)
                    | SessionError::Cancelled(_) => StatusCode::CONFLICT,
                };
                (status, e.code().into())
            }
            ApiError::Dispatch(e) => {
                let status = match e {
                    DispatchError::UnsupportedType(_) | DispatchError::InvalidPayload(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    DispatchError::NotConnected(_) => StatusCode::CONFLICT,
                    DispatchError::SendFailed(_) => StatusCode::BAD_GATEWAY,
                };
                (status, e.code().into())
            }
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed".into()),
            ApiError::Domain(e) => {
                let status = match e.code {
                    ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
                    ErrorCode::InstanceNotFound | ErrorCode::ApiKeyNotFound => {
                        StatusCode::NOT_FOUND
                    }
                    ErrorCode::InvalidStateTransition => StatusCode::CONFLICT,
                    ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
                    ErrorCode::Forbidden => StatusCode::FORBIDDEN,
                    ErrorCode::EngineError => StatusCode::BAD_GATEWAY,
                    ErrorCode::DatabaseError | ErrorCode::InternalError => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.code.to_string().to_ascii_lowercase())
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Auth(e) => e.to_string(),
            ApiError::Authz(e) => e.to_string(),
            ApiError::ApiKey(e) => e.to_string(),
            ApiError::Session(e) => e.to_string(),
            ApiError::Dispatch(e) => e.to_string(),
            ApiError::Validation(e) => e.to_string(),
            ApiError::Domain(e) => e.message.clone(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Authz(err)
    }
}

impl From<ApiKeyError> for ApiError {
    fn from(err: ApiKeyError) -> Self {
        ApiError::ApiKey(err)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Session(err)
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        ApiError::Dispatch(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code = %code, error = %self.message(), "Request failed");
        }
        let body = ErrorResponse::new(code, self.message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{InstanceKey, PrincipalId};

    fn key() -> InstanceKey {
        InstanceKey::new("sales").unwrap()
    }

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Status mapping
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn credential_failures_are_401() {
        assert_eq!(status_of(AuthError::MissingKey), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::ExpiredKey), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unreachable_key_store_is_503() {
        assert_eq!(
            status_of(AuthError::Unavailable("db down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn scope_failures_are_403() {
        assert_eq!(status_of(AuthzError::InstanceForbidden(key())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AuthzError::SuperAdminRequired), StatusCode::FORBIDDEN);
    }

    #[test]
    fn qr_timeout_is_distinct_from_server_error() {
        assert_eq!(status_of(SessionError::Timeout(30)), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            status_of(SessionError::pairing_failed("engine down")),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn dispatch_errors_map_by_cause() {
        assert_eq!(
            status_of(DispatchError::UnsupportedType("sticker".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(DispatchError::NotConnected(key())), StatusCode::CONFLICT);
    }

    #[test]
    fn api_key_errors_map_by_cause() {
        assert_eq!(
            status_of(ApiKeyError::NotFound(PrincipalId::new(9))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(ApiKeyError::CannotRevokeSelf), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(ApiKeyError::Storage("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn storage_domain_error_is_500_with_lowercase_code() {
        let err = ApiError::from(DomainError::database("connection reset"));
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "database_error");
    }

    #[test]
    fn body_carries_wire_code() {
        let err = ApiError::from(SessionError::NotConnected(key()));
        let (_, code) = err.status_and_code();
        assert_eq!(code, "not_connected");
        assert_eq!(err.message(), "Instance 'sales' is not connected");
    }
}
