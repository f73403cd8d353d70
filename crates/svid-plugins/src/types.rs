//! Plugin result types

use serde::{Deserialize, Serialize};
use svid_core::SpiffeId;

/// Outcome of checking a node's attestation evidence
///
/// `base_spiffe_id` is the identity the evidence proves, derived by the
/// attestor independently of anything the node claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestResponse {
    /// Whether the evidence is acceptable
    pub valid: bool,

    /// SPIFFE ID proven by the evidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_spiffe_id: Option<SpiffeId>,
}

impl AttestResponse {
    /// Evidence accepted and proves `base_spiffe_id`
    pub fn valid(base_spiffe_id: SpiffeId) -> Self {
        Self {
            valid: true,
            base_spiffe_id: Some(base_spiffe_id),
        }
    }

    /// Evidence rejected
    pub fn invalid() -> Self {
        Self {
            valid: false,
            base_spiffe_id: None,
        }
    }

    /// The proven ID, only when the evidence was accepted
    pub fn proven_id(&self) -> Option<&SpiffeId> {
        if self.valid {
            self.base_spiffe_id.as_ref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proven_id_requires_valid() {
        let id = SpiffeId::parse("spiffe://example.org/node/A").unwrap();

        assert_eq!(AttestResponse::valid(id.clone()).proven_id(), Some(&id));
        assert_eq!(AttestResponse::invalid().proven_id(), None);

        let forged = AttestResponse {
            valid: false,
            base_spiffe_id: Some(id),
        };
        assert_eq!(forged.proven_id(), None);
    }
}
