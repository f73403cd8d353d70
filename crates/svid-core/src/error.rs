//! Error types for the SVID core types

use thiserror::Error;

/// Result type alias using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while parsing identities, selectors and CSRs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The string is not a well-formed SPIFFE ID
    #[error("Invalid SPIFFE ID '{id}': {reason}")]
    InvalidSpiffeId { id: String, reason: String },

    /// The string is not a `type:value` selector
    #[error("Invalid selector '{0}': expected 'type:value'")]
    InvalidSelector(String),

    /// The CSR could not be decoded
    #[error("Malformed CSR: {0}")]
    MalformedCsr(String),

    /// The CSR does not carry exactly one URI SAN
    #[error("CSR must have exactly one URI SAN, found {0}")]
    UriSanCount(usize),

    /// The CSR self-signature does not verify
    #[error("CSR signature verification failed: {0}")]
    CsrSignature(String),

    /// Unknown attestation type name
    #[error("Unknown attestation type: {0}")]
    UnknownAttestationType(String),
}
