//! API-key authentication middleware and extractors for axum.
//!
//! This module provides:
//! - `api_key_middleware` - Layer that validates the presented API key and
//!   injects the resolved `Principal` into request extensions
//! - `RequirePrincipal` - Extractor for handlers behind the layer
//! - `RequireSuperAdmin` - Extractor that additionally demands super_admin
//!
//! ```text
//! Request → api_key_middleware → injects Principal into extensions
//!                                      ↓
//!                      Handler → RequirePrincipal extractor reads from extensions
//! ```
//!
//! The credential is read from the `apikey` header, then `x-api-key`, then the
//! `?apikey=` query parameter.

use axum::{
    extract::{Query, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::adapters::http::error::{ApiError, ErrorResponse};
use crate::application::handlers::AccessGate;
use crate::domain::access::{AuthError, Principal};

/// Header names checked for a credential, in order.
pub const API_KEY_HEADERS: [&str; 2] = ["apikey", "x-api-key"];

#[derive(Debug, Default, Deserialize)]
struct ApiKeyQuery {
    apikey: Option<String>,
}

/// Pulls the raw credential out of a request.
pub fn extract_credential(headers: &HeaderMap, uri: &axum::http::Uri) -> Option<String> {
    API_KEY_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .find(|value| !value.trim().is_empty())
        .map(str::to_string)
        .or_else(|| {
            Query::<ApiKeyQuery>::try_from_uri(uri)
                .ok()
                .and_then(|Query(q)| q.apikey)
                .filter(|v| !v.trim().is_empty())
        })
}

/// Authentication middleware for every `/v1` route.
///
/// Rejects the request before any handler runs when the credential is
/// missing, unknown, inactive or expired.
pub async fn api_key_middleware(
    State(gate): State<AccessGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let credential = extract_credential(request.headers(), request.uri());

    match gate.validate(credential.as_deref()).await {
        Ok(principal) => {
            tracing::debug!(
                principal_id = %principal.id,
                kind = %principal.kind,
                path = %request.uri().path(),
                "Authenticated request"
            );
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => {
            if let AuthError::Unavailable(reason) = &e {
                tracing::error!(error = %reason, "API key store unavailable");
            }
            ApiError::from(e).into_response()
        }
    }
}

/// Extractor that requires an authenticated principal.
#[derive(Debug, Clone)]
pub struct RequirePrincipal(pub Principal);

impl<S> axum::extract::FromRequestParts<S> for RequirePrincipal
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<Principal>()
                .cloned()
                .map(RequirePrincipal)
                .ok_or(AuthRejection::Unauthenticated)
        })
    }
}

/// Extractor that requires a super_admin principal.
#[derive(Debug, Clone)]
pub struct RequireSuperAdmin(pub Principal);

impl<S> axum::extract::FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let principal = parts
                .extensions
                .get::<Principal>()
                .cloned()
                .ok_or(AuthRejection::Unauthenticated)?;
            if principal.is_super_admin() {
                Ok(RequireSuperAdmin(principal))
            } else {
                Err(AuthRejection::SuperAdminRequired)
            }
        })
    }
}

/// Rejection type for the principal extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// The request never passed through the API-key layer.
    Unauthenticated,
    SuperAdminRequired,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthRejection::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "missing_key", "API key is required")
            }
            AuthRejection::SuperAdminRequired => (
                StatusCode::FORBIDDEN,
                "super_admin_required",
                "Super admin privileges required",
            ),
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts;
    use axum::http::{HeaderValue, Uri};
    use std::collections::BTreeSet;

    use crate::domain::access::PrincipalKind;
    use crate::domain::foundation::{PrincipalId, Timestamp};

    fn principal(kind: PrincipalKind) -> Principal {
        Principal {
            id: PrincipalId::new(1),
            key_hash: "h".into(),
            key_prefix: "nxus_abc".into(),
            name: "ops".into(),
            kind,
            active: true,
            allowed_instances: BTreeSet::new(),
            created_at: Timestamp::now(),
            expires_at: None,
            last_used_at: None,
            request_count: 0,
        }
    }

    fn parts_with(principal: Option<Principal>) -> Parts {
        let mut request: axum::http::Request<()> =
            axum::http::Request::builder().uri("/v1/me").body(()).unwrap();
        if let Some(p) = principal {
            request.extensions_mut().insert(p);
        }
        request.into_parts().0
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Credential extraction
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn apikey_header_wins_over_alternatives() {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_static("first"));
        headers.insert("x-api-key", HeaderValue::from_static("second"));
        let uri: Uri = "/v1/me?apikey=third".parse().unwrap();

        assert_eq!(extract_credential(&headers, &uri).as_deref(), Some("first"));
    }

    #[test]
    fn x_api_key_header_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("second"));
        let uri: Uri = "/v1/me".parse().unwrap();

        assert_eq!(extract_credential(&headers, &uri).as_deref(), Some("second"));
    }

    #[test]
    fn query_parameter_is_the_fallback() {
        let uri: Uri = "/v1/me?apikey=third&x=1".parse().unwrap();
        assert_eq!(
            extract_credential(&HeaderMap::new(), &uri).as_deref(),
            Some("third")
        );
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_static("  "));
        let uri: Uri = "/v1/me?apikey=".parse().unwrap();

        assert_eq!(extract_credential(&headers, &uri), None);
    }

    #[test]
    fn credential_is_passed_through_unaltered() {
        let uri: Uri = "/v1/me?apikey=%20nxus_abc".parse().unwrap();
        assert_eq!(
            extract_credential(&HeaderMap::new(), &uri).as_deref(),
            Some(" nxus_abc")
        );
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Extractors
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn require_principal_reads_extensions() {
        let mut parts = parts_with(Some(principal(PrincipalKind::User)));
        let RequirePrincipal(p) = RequirePrincipal::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(p.name, "ops");
    }

    #[tokio::test]
    async fn require_principal_fails_without_layer() {
        let mut parts = parts_with(None);
        let result = RequirePrincipal::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthRejection::Unauthenticated)));
    }

    #[tokio::test]
    async fn require_super_admin_rejects_users() {
        let mut parts = parts_with(Some(principal(PrincipalKind::User)));
        let result = RequireSuperAdmin::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthRejection::SuperAdminRequired)));

        let mut parts = parts_with(Some(principal(PrincipalKind::SuperAdmin)));
        assert!(RequireSuperAdmin::from_request_parts(&mut parts, &())
            .await
            .is_ok());
    }

    #[test]
    fn rejections_map_to_401_and_403() {
        assert_eq!(
            AuthRejection::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::SuperAdminRequired.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn extractors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RequirePrincipal>();
        assert_send_sync::<RequireSuperAdmin>();
    }
}
