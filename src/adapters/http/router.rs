//! Top-level gateway router.
//!
//! `/health` is public. Everything under `/v1` passes through the API-key
//! layer before reaching a handler.

use axum::{
    http::HeaderValue,
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;

use super::access::access_routes;
use super::instances::instance_routes;
use super::messaging::message_routes;
use super::middleware::api_key_middleware;
use super::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health - Liveness check, no credential required
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// All authenticated routes, relative to `/v1`.
pub fn v1_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(access_routes())
        .merge(instance_routes())
        .merge(message_routes())
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            api_key_middleware,
        ))
}

/// Builds the complete gateway application.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/v1", v1_routes(&state))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&server.cors_origins_list()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Any origin when none are configured, otherwise only the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::adapters::engine::MockProtocolEngine;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::{
        InMemoryApiKeyRepository, InMemoryInstanceRepository, InMemoryMirrorReader,
    };
    use crate::application::handlers::MessageDispatcher;
    use crate::application::{SessionRegistry, SessionRegistryConfig};

    fn app() -> Router {
        let registry = SessionRegistry::new(
            Arc::new(MockProtocolEngine::new()),
            Arc::new(InMemoryEventBus::new()),
            SessionRegistryConfig::default(),
        );
        let state = AppState::new(
            registry.clone(),
            MessageDispatcher::new(registry),
            Arc::new(InMemoryApiKeyRepository::new()),
            Arc::new(InMemoryInstanceRepository::new()),
            Arc::new(InMemoryMirrorReader::new()),
        );
        build_router(state, &ServerConfig::default())
    }

    #[tokio::test]
    async fn health_needs_no_credential() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn v1_routes_reject_missing_credential() {
        let response = app()
            .oneshot(Request::builder().uri("/v1/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_key_is_rejected() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/v1/instances")
                    .header("apikey", "nxus_not-a-real-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn cors_accepts_configured_and_default_origins() {
        let _ = cors_layer(&[]);
        let _ = cors_layer(&["https://app.example.com".to_string(), "bad\norigin".to_string()]);
    }
}
