//! Error types for attestation and resolution plugins

use thiserror::Error;

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;

/// Errors that can occur inside a plugin
#[derive(Error, Debug)]
pub enum PluginError {
    /// Evidence payload could not be decoded
    #[error("Invalid attestation data: {0}")]
    InvalidData(String),

    /// No attestor registered for the evidence type
    #[error("No attestor registered for attestation type: {0}")]
    UnsupportedType(String),

    /// Attestor rejected the evidence outright
    #[error("Attestation failed: {0}")]
    AttestationFailed(String),

    /// Node resolver failure
    #[error("Node resolution failed: {0}")]
    Resolution(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<svid_core::CoreError> for PluginError {
    fn from(err: svid_core::CoreError) -> Self {
        PluginError::InvalidData(err.to_string())
    }
}
