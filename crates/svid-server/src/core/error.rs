//! Error taxonomy of the node service

use thiserror::Error;

use svid_core::{CoreError, SpiffeId};
use svid_plugins::PluginError;

use crate::ca::CaError;
use crate::storage::StorageError;

/// Errors returned by [`NodeService`](super::NodeService) operations
///
/// Every error aborts the whole call.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Malformed CSR or identity. Not retriable without correction.
    #[error("Parse error: {0}")]
    Parse(#[from] CoreError),

    /// Evidence rejected, or the proven ID differs from the CSR's.
    #[error("Attestation failed: {0}")]
    Attestation(String),

    /// CA failure. Safe to retry the whole call.
    #[error("Signing failed: {0}")]
    Signing(#[from] CaError),

    /// Caller has no registration entry for the requested ID.
    #[error("Not entitled to {0}")]
    NotEntitled(SpiffeId),

    #[error("Data store error: {0}")]
    DataStore(#[from] StorageError),

    /// Node resolver failure. May be transient.
    #[error("Node resolution failed: {0}")]
    NodeResolution(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl NodeError {
    /// Build an attestation error from an attestor failure
    pub(crate) fn attestor(err: PluginError) -> Self {
        NodeError::Attestation(err.to_string())
    }

    /// Build a resolution error from a node resolver failure
    pub(crate) fn resolver(err: PluginError) -> Self {
        NodeError::NodeResolution(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;
