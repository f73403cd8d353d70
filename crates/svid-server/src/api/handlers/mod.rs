//! API request handlers

pub mod bundle;
pub mod node;

pub use bundle::{fetch_bundle, fetch_federated_bundle, BundleResponse};
pub use node::{
    fetch_base_svid, fetch_svid, AttestedDataBody, FetchBaseSvidRequest, FetchSvidRequest,
    SvidBody, SvidUpdateResponse,
};

use crate::core::NodeService;

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Node attestation and issuance service
    pub service: NodeService,
}

impl AppState {
    pub fn new(service: NodeService) -> Self {
        Self { service }
    }
}
