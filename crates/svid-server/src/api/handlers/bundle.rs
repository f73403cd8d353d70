//! Trust bundle handlers

use axum::{
    extract::{Path, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;
use crate::api::error::ApiError;

/// CA certificates of a trust domain
#[derive(Debug, Serialize, Deserialize)]
pub struct BundleResponse {
    pub trust_domain: String,
    /// Base64-encoded DER certificates
    pub certificates: Vec<String>,
}

impl BundleResponse {
    fn new(trust_domain: impl Into<String>, certificates: Vec<Vec<u8>>) -> Self {
        Self {
            trust_domain: trust_domain.into(),
            certificates: certificates.iter().map(|c| STANDARD.encode(c)).collect(),
        }
    }
}

/// Get this server's trust bundle
///
/// GET /v1/node/bundle
pub async fn fetch_bundle(State(state): State<Arc<AppState>>) -> Json<BundleResponse> {
    Json(BundleResponse::new(
        state.service.trust_domain(),
        state.service.fetch_cp_bundle(),
    ))
}

/// Get the bundle of a federated trust domain
///
/// GET /v1/node/federated-bundle/{trust_domain}
pub async fn fetch_federated_bundle(
    State(state): State<Arc<AppState>>,
    Path(trust_domain): Path<String>,
) -> Result<Json<BundleResponse>, ApiError> {
    let certificates = state.service.fetch_federated_bundle(&trust_domain).await?;
    Ok(Json(BundleResponse::new(trust_domain, certificates)))
}
