//! Mock Node Attestor
//!
//! For testing purposes - evidence carries the SPIFFE ID it proves.

use async_trait::async_trait;

use svid_core::{AttestationType, AttestedData, SpiffeId};

use crate::attestor::NodeAttestor;
use crate::error::{PluginError, Result};
use crate::types::AttestResponse;

/// Mock attestor for testing
///
/// Accepts evidence in the format:
/// - "spiffe://td/path" - Valid evidence proving that ID
/// - "INVALID" - Evidence rejected (`valid = false`)
/// - "FAIL:message" - Returns an error with the given message
pub struct MockAttestor;

impl MockAttestor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockAttestor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeAttestor for MockAttestor {
    fn attestation_type(&self) -> AttestationType {
        AttestationType::Mock
    }

    fn description(&self) -> &str {
        "mock node attestor"
    }

    async fn attest(&self, data: &AttestedData, _attested_before: bool) -> Result<AttestResponse> {
        let evidence = std::str::from_utf8(&data.data)
            .map_err(|e| PluginError::InvalidData(format!("mock evidence is not UTF-8: {}", e)))?;

        if let Some(message) = evidence.strip_prefix("FAIL:") {
            return Err(PluginError::AttestationFailed(message.to_string()));
        }

        if evidence == "INVALID" {
            return Ok(AttestResponse::invalid());
        }

        let id = SpiffeId::parse(evidence)?;
        Ok(AttestResponse::valid(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(s: &str) -> AttestedData {
        AttestedData::new(AttestationType::Mock, s)
    }

    #[tokio::test]
    async fn test_valid_evidence() {
        let response = MockAttestor::new()
            .attest(&evidence("spiffe://example.org/node/A"), false)
            .await
            .unwrap();

        assert!(response.valid);
        assert_eq!(
            response.base_spiffe_id.unwrap().as_str(),
            "spiffe://example.org/node/A"
        );
    }

    #[tokio::test]
    async fn test_invalid_evidence() {
        let response = MockAttestor::new().attest(&evidence("INVALID"), false).await.unwrap();
        assert!(!response.valid);
    }

    #[tokio::test]
    async fn test_explicit_failure() {
        let result = MockAttestor::new().attest(&evidence("FAIL:boom"), false).await;

        match result {
            Err(PluginError::AttestationFailed(msg)) => assert_eq!(msg, "boom"),
            other => panic!("Expected AttestationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_id() {
        let result = MockAttestor::new().attest(&evidence("node-a"), false).await;
        assert!(matches!(result, Err(PluginError::InvalidData(_))));
    }
}
