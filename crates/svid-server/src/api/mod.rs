//! HTTP API of the node service

pub mod error;
pub mod handlers;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use handlers::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub trust_domain: String,
    pub attestation_types: Vec<String>,
    pub base_svid_ttl: i32,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Readiness check endpoint
///
/// GET /ready
pub async fn ready(State(state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    let service = &state.service;
    let mut attestation_types: Vec<String> = service
        .attestors()
        .registered_types()
        .iter()
        .map(|t| t.to_string())
        .collect();
    attestation_types.sort();

    Json(ReadyResponse {
        ready: !attestation_types.is_empty(),
        trust_domain: service.trust_domain().to_string(),
        attestation_types,
        base_svid_ttl: service.config().base_svid_ttl,
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Node endpoints
        .route("/v1/node/base-svid", post(handlers::fetch_base_svid))
        .route("/v1/node/svid", post(handlers::fetch_svid))
        // Bundle endpoints
        .route("/v1/node/bundle", get(handlers::fetch_bundle))
        .route(
            "/v1/node/federated-bundle/{trust_domain}",
            get(handlers::fetch_federated_bundle),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
