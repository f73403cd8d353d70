//! Node API handlers
//!
//! Agents bootstrap with a CSR plus attestation evidence, then renew and
//! fetch workload SVIDs with CSRs alone. CSRs and certificates travel as
//! base64-encoded DER.

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use svid_core::{AttestationType, AttestedData, RegistrationEntry, SpiffeId, SvidUpdate};

use super::AppState;
use crate::api::error::ApiError;

/// Attestation evidence on the wire
#[derive(Debug, Serialize, Deserialize)]
pub struct AttestedDataBody {
    #[serde(rename = "type")]
    pub attestation_type: AttestationType,
    /// Base64-encoded evidence payload
    pub data: String,
}

/// Request to bootstrap a node
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchBaseSvidRequest {
    /// Base64-encoded DER CSR naming the node's SPIFFE ID
    pub csr: String,
    pub attested_data: AttestedDataBody,
}

/// Request to issue SVIDs for a previously attested caller
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchSvidRequest {
    /// SPIFFE ID of the caller
    pub spiffe_id: String,
    /// Base64-encoded DER CSRs
    #[serde(default)]
    pub csrs: Vec<String>,
}

/// A signed SVID on the wire
#[derive(Debug, Serialize, Deserialize)]
pub struct SvidBody {
    /// Base64-encoded DER certificate
    pub cert: String,
    pub ttl: i32,
}

/// Response of both node endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct SvidUpdateResponse {
    /// Signed SVIDs keyed by SPIFFE ID
    pub svids: HashMap<String, SvidBody>,
    pub registration_entries: Vec<RegistrationEntry>,
}

impl From<SvidUpdate> for SvidUpdateResponse {
    fn from(update: SvidUpdate) -> Self {
        Self {
            svids: update
                .svids
                .into_iter()
                .map(|(id, svid)| {
                    (
                        id.into(),
                        SvidBody {
                            cert: STANDARD.encode(&svid.cert),
                            ttl: svid.ttl,
                        },
                    )
                })
                .collect(),
            registration_entries: update.registration_entries,
        }
    }
}

/// Bootstrap a node
///
/// POST /v1/node/base-svid
pub async fn fetch_base_svid(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FetchBaseSvidRequest>,
) -> Result<Json<SvidUpdateResponse>, ApiError> {
    let csr = STANDARD.decode(&request.csr)?;
    let attested_data = AttestedData::new(
        request.attested_data.attestation_type,
        STANDARD.decode(&request.attested_data.data)?,
    );

    let update = state.service.fetch_base_svid(&csr, &attested_data).await?;

    info!(
        attestation_type = %attested_data.attestation_type,
        entries = update.registration_entries.len(),
        "Served base SVID request"
    );

    Ok(Json(update.into()))
}

/// Issue SVIDs for an attested caller
///
/// POST /v1/node/svid
pub async fn fetch_svid(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FetchSvidRequest>,
) -> Result<Json<SvidUpdateResponse>, ApiError> {
    let spiffe_id = SpiffeId::parse(request.spiffe_id)?;
    let csrs = request
        .csrs
        .iter()
        .map(|csr| STANDARD.decode(csr))
        .collect::<Result<Vec<_>, _>>()?;

    let update = state.service.fetch_svid(&spiffe_id, &csrs).await?;

    info!(caller = %spiffe_id, svids = update.svids.len(), "Served SVID request");

    Ok(Json(update.into()))
}
