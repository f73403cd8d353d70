//! Server certificate authority
//!
//! The node service never touches key material. It hands validated CSRs to a
//! [`ServerCa`] and gets back DER certificates.

mod self_signed;

pub use self_signed::SelfSignedCa;

use async_trait::async_trait;

/// Error type for CA operations
#[derive(Debug, thiserror::Error)]
pub enum CaError {
    #[error("Invalid CSR: {0}")]
    InvalidCsr(String),

    #[error("Trust domain mismatch: expected {expected}, got {actual}")]
    TrustDomainMismatch { expected: String, actual: String },

    #[error("Unsupported key algorithm")]
    UnsupportedAlgorithm,

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Certificate authority that signs node and workload CSRs
#[async_trait]
pub trait ServerCa: Send + Sync {
    /// Sign a DER-encoded CSR, returning the DER-encoded certificate
    async fn sign_csr(&self, csr: &[u8]) -> Result<Vec<u8>, CaError>;

    /// DER-encoded CA certificates of the server's trust domain
    fn bundle(&self) -> Vec<Vec<u8>>;

    /// Trust domain the CA issues for
    fn trust_domain(&self) -> &str;
}
