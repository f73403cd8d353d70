//! Node attestor trait and the per-type attestor set

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use svid_core::{AttestationType, AttestedData};

use crate::error::{PluginError, Result};
use crate::types::AttestResponse;

/// Trait for node attestors
///
/// Each attestor verifies one kind of attestation evidence and derives the
/// SPIFFE ID that the evidence proves.
#[async_trait]
pub trait NodeAttestor: Send + Sync {
    /// The evidence type this attestor checks
    fn attestation_type(&self) -> AttestationType;

    /// Check evidence and derive the node's base SPIFFE ID
    ///
    /// # Arguments
    /// * `data` - Evidence submitted by the node
    /// * `attested_before` - Whether the claimed ID already has an attested-node record
    ///
    /// # Returns
    /// * `Ok(AttestResponse)` - Verdict and the proven ID
    /// * `Err(PluginError)` - If the evidence could not be processed at all
    async fn attest(&self, data: &AttestedData, attested_before: bool) -> Result<AttestResponse>;

    /// Get a description of this attestor (for logging)
    fn description(&self) -> &str {
        "node attestor"
    }
}

/// Attestors keyed by attestation type
///
/// Built once at startup and handed to the node service; evidence is routed
/// by its [`AttestationType`] tag.
#[derive(Clone)]
pub struct AttestorSet {
    attestors: HashMap<AttestationType, Arc<dyn NodeAttestor>>,
}

impl AttestorSet {
    /// Create an empty attestor set
    pub fn new() -> Self {
        Self {
            attestors: HashMap::new(),
        }
    }

    /// Register an attestor, replacing any previous one for the same type
    pub fn register<A: NodeAttestor + 'static>(&mut self, attestor: A) {
        self.register_arc(Arc::new(attestor));
    }

    /// Register a shared attestor
    pub fn register_arc(&mut self, attestor: Arc<dyn NodeAttestor>) {
        let attestation_type = attestor.attestation_type();
        info!(
            attestation_type = %attestation_type,
            description = attestor.description(),
            "Registered node attestor"
        );
        self.attestors.insert(attestation_type, attestor);
    }

    /// Check if an attestor is registered for a type
    pub fn has_attestor(&self, attestation_type: AttestationType) -> bool {
        self.attestors.contains_key(&attestation_type)
    }

    /// List all registered attestation types
    pub fn registered_types(&self) -> Vec<AttestationType> {
        self.attestors.keys().copied().collect()
    }

    /// Route evidence to the attestor for its type
    pub async fn attest(&self, data: &AttestedData, attested_before: bool) -> Result<AttestResponse> {
        let attestation_type = data.attestation_type;
        let attestor = self.attestors.get(&attestation_type).ok_or_else(|| {
            warn!(attestation_type = %attestation_type, "No attestor for attestation type");
            PluginError::UnsupportedType(attestation_type.to_string())
        })?;

        let result = attestor.attest(data, attested_before).await;

        match &result {
            Ok(response) if response.valid => {
                info!(
                    attestation_type = %attestation_type,
                    base_spiffe_id = ?response.base_spiffe_id.as_ref().map(|id| id.as_str()),
                    attested_before,
                    "Attestation evidence accepted"
                );
            }
            Ok(_) => {
                warn!(attestation_type = %attestation_type, "Attestation evidence rejected");
            }
            Err(e) => {
                warn!(
                    attestation_type = %attestation_type,
                    error = %e,
                    "Attestor failed"
                );
            }
        }

        result
    }
}

impl Default for AttestorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AttestorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestorSet")
            .field("types", &self.registered_types())
            .finish()
    }
}

/// Builder for creating an AttestorSet
pub struct AttestorSetBuilder {
    set: AttestorSet,
}

impl AttestorSetBuilder {
    pub fn new() -> Self {
        Self {
            set: AttestorSet::new(),
        }
    }

    /// Add an attestor
    pub fn with_attestor<A: NodeAttestor + 'static>(mut self, attestor: A) -> Self {
        self.set.register(attestor);
        self
    }

    /// Add a shared attestor
    pub fn with_shared_attestor(mut self, attestor: Arc<dyn NodeAttestor>) -> Self {
        self.set.register_arc(attestor);
        self
    }

    pub fn build(self) -> AttestorSet {
        self.set
    }
}

impl Default for AttestorSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
