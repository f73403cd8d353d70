//! Node service
//!
//! Orchestrates the two agent-facing flows:
//!
//! - **Bootstrap** ([`NodeService::fetch_base_svid`]): attest the node, sign
//!   its base SVID, record the attestation, then resolve its entries.
//! - **Renewal** ([`NodeService::fetch_svid`]): resolve what the caller is
//!   entitled to, check every CSR against that, then sign.
//!
//! The service holds no request state. Dropping a call's future stops it at
//! the next collaborator call, so nothing is signed or written afterwards.
//!
//! Two concurrent first-time bootstraps for the same ID can both see no
//! attested-node record and both get a certificate signed. Only one
//! `create_attested_node` succeeds; the other call fails with
//! `DataStore(AlreadyExists)` and its certificate is discarded. The record
//! itself stays consistent.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use svid_core::{
    spiffe_id_from_csr, AttestedData, RegistrationEntry, Selector, SpiffeId, Svid, SvidUpdate,
};
use svid_plugins::{AttestorSet, NodeResolver};

use super::entries::resolve_registration_entries;
use super::error::{NodeError, Result};
use crate::ca::ServerCa;
use crate::storage::DataStore;

/// Default TTL reported for base SVIDs, in seconds
pub const DEFAULT_BASE_SVID_TTL: i32 = 3600;

/// Node service configuration
#[derive(Debug, Clone)]
pub struct NodeServiceConfig {
    /// TTL reported for base SVIDs, in seconds
    pub base_svid_ttl: i32,
}

impl Default for NodeServiceConfig {
    fn default() -> Self {
        Self {
            base_svid_ttl: DEFAULT_BASE_SVID_TTL,
        }
    }
}

/// Node attestation and SVID issuance service
#[derive(Clone)]
pub struct NodeService {
    config: NodeServiceConfig,
    store: Arc<dyn DataStore>,
    ca: Arc<dyn ServerCa>,
    attestors: AttestorSet,
    resolver: Arc<dyn NodeResolver>,
}

impl NodeService {
    pub fn new(
        config: NodeServiceConfig,
        store: Arc<dyn DataStore>,
        ca: Arc<dyn ServerCa>,
        attestors: AttestorSet,
        resolver: Arc<dyn NodeResolver>,
    ) -> Self {
        Self {
            config,
            store,
            ca,
            attestors,
            resolver,
        }
    }

    pub fn config(&self) -> &NodeServiceConfig {
        &self.config
    }

    /// Trust domain the service issues for
    pub fn trust_domain(&self) -> &str {
        self.ca.trust_domain()
    }

    pub fn attestors(&self) -> &AttestorSet {
        &self.attestors
    }

    /// Bootstrap a node: attest it and issue its base SVID
    ///
    /// Steps run strictly in order and abort on the first error:
    /// 1. Extract the claimed ID from the CSR
    /// 2. Look up whether the ID attested before
    /// 3. Check the evidence with the attestor for its type
    /// 4. Require a valid verdict proving exactly the claimed ID
    /// 5. Sign the CSR
    /// 6. Create or update the attested-node record
    /// 7. Resolve and record the node's selectors, then resolve its entries
    ///
    /// A failure in step 7 leaves the node attested (step 6 is already
    /// committed) with no recorded selectors; a retried bootstrap repairs it.
    pub async fn fetch_base_svid(
        &self,
        csr: &[u8],
        attested_data: &AttestedData,
    ) -> Result<SvidUpdate> {
        let spiffe_id = spiffe_id_from_csr(csr).map_err(|e| {
            warn!(error = %e, "Rejected malformed bootstrap CSR");
            NodeError::Parse(e)
        })?;

        let attested_before = self
            .store
            .fetch_attested_node(&spiffe_id)
            .await
            .map_err(|e| {
                error!(spiffe_id = %spiffe_id, error = %e, "Failed to look up attested node");
                NodeError::DataStore(e)
            })?
            .is_some();

        let response = self
            .attestors
            .attest(attested_data, attested_before)
            .await
            .map_err(NodeError::attestor)?;

        match response.proven_id() {
            Some(proven) if proven == &spiffe_id => {}
            Some(proven) => {
                warn!(
                    spiffe_id = %spiffe_id,
                    proven_id = %proven,
                    "SECURITY: CSR claims an ID the evidence does not prove"
                );
                return Err(NodeError::Attestation(format!(
                    "evidence proves {proven}, CSR claims {spiffe_id}"
                )));
            }
            None => {
                warn!(spiffe_id = %spiffe_id, "Attestation evidence rejected");
                return Err(NodeError::Attestation("invalid attestation evidence".into()));
            }
        }

        let cert = self.ca.sign_csr(csr).await.map_err(|e| {
            error!(spiffe_id = %spiffe_id, error = %e, "Failed to sign base SVID");
            NodeError::Signing(e)
        })?;

        let write = if attested_before {
            self.store.update_attested_node(&spiffe_id, &cert).await
        } else {
            self.store
                .create_attested_node(attested_data.attestation_type, &spiffe_id, &cert)
                .await
        };
        write.map_err(|e| {
            error!(spiffe_id = %spiffe_id, error = %e, "Failed to record attested node");
            NodeError::DataStore(e)
        })?;

        let selectors = self.resolve_node_selectors(&spiffe_id).await?;
        for selector in &selectors {
            self.store
                .create_node_resolver_map_entry(&spiffe_id, selector)
                .await
                .map_err(|e| {
                    error!(spiffe_id = %spiffe_id, selector = %selector, error = %e, "Failed to record node selector");
                    NodeError::DataStore(e)
                })?;
        }

        let registration_entries =
            resolve_registration_entries(self.store.as_ref(), &selectors, &spiffe_id).await?;

        info!(
            spiffe_id = %spiffe_id,
            attestation_type = %attested_data.attestation_type,
            attested_before,
            selectors = selectors.len(),
            entries = registration_entries.len(),
            "Issued base SVID"
        );

        let mut svids = HashMap::new();
        svids.insert(
            spiffe_id,
            Svid {
                cert,
                ttl: self.config.base_svid_ttl,
            },
        );

        Ok(SvidUpdate {
            svids,
            registration_entries,
        })
    }

    /// Issue SVIDs for IDs the caller is entitled to
    ///
    /// Every CSR is checked before any is signed, so a batch with one bad or
    /// unentitled CSR produces no certificates. An empty batch returns just
    /// the caller's entries.
    pub async fn fetch_svid(&self, spiffe_id: &SpiffeId, csrs: &[Vec<u8>]) -> Result<SvidUpdate> {
        let selectors = self
            .store
            .fetch_node_resolver_map_entries(spiffe_id)
            .await
            .map_err(|e| {
                error!(spiffe_id = %spiffe_id, error = %e, "Failed to fetch node selectors");
                NodeError::DataStore(e)
            })?;

        let registration_entries =
            resolve_registration_entries(self.store.as_ref(), &selectors, spiffe_id).await?;

        let by_id: HashMap<&SpiffeId, &RegistrationEntry> = registration_entries
            .iter()
            .map(|entry| (&entry.spiffe_id, entry))
            .collect();

        let mut approved = Vec::with_capacity(csrs.len());
        for csr in csrs {
            let requested = spiffe_id_from_csr(csr).map_err(|e| {
                warn!(caller = %spiffe_id, error = %e, "Rejected malformed CSR");
                NodeError::Parse(e)
            })?;
            let entry = by_id.get(&requested).ok_or_else(|| {
                warn!(
                    caller = %spiffe_id,
                    requested = %requested,
                    "SECURITY: CSR for an ID the caller is not entitled to"
                );
                NodeError::NotEntitled(requested.clone())
            })?;
            approved.push((csr, requested, entry.ttl));
        }

        let mut svids = HashMap::with_capacity(approved.len());
        for (csr, requested, ttl) in approved {
            let cert = self.ca.sign_csr(csr).await.map_err(|e| {
                error!(caller = %spiffe_id, requested = %requested, error = %e, "Failed to sign SVID");
                NodeError::Signing(e)
            })?;
            svids.insert(requested, Svid { cert, ttl });
        }

        info!(
            caller = %spiffe_id,
            svids = svids.len(),
            entries = registration_entries.len(),
            "Issued SVIDs"
        );

        Ok(SvidUpdate {
            svids,
            registration_entries,
        })
    }

    /// CA certificates of the server's own trust domain
    pub fn fetch_cp_bundle(&self) -> Vec<Vec<u8>> {
        self.ca.bundle()
    }

    /// CA certificates of a federated trust domain
    pub async fn fetch_federated_bundle(&self, trust_domain: &str) -> Result<Vec<Vec<u8>>> {
        let bundle = self
            .store
            .fetch_federated_bundle(trust_domain)
            .await
            .map_err(|e| {
                error!(trust_domain = %trust_domain, error = %e, "Failed to fetch federated bundle");
                NodeError::DataStore(e)
            })?;

        bundle.ok_or_else(|| {
            warn!(trust_domain = %trust_domain, "No bundle for federated trust domain");
            NodeError::NotFound(format!("federated bundle for {trust_domain}"))
        })
    }

    async fn resolve_node_selectors(&self, spiffe_id: &SpiffeId) -> Result<Vec<Selector>> {
        let mut resolved = self
            .resolver
            .resolve(std::slice::from_ref(spiffe_id))
            .await
            .map_err(|e| {
                error!(spiffe_id = %spiffe_id, error = %e, "Node resolver failed");
                NodeError::resolver(e)
            })?;

        Ok(resolved.remove(spiffe_id).unwrap_or_default())
    }
}

impl std::fmt::Debug for NodeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeService")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("attestors", &self.attestors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::SelfSignedCa;
    use crate::storage::MemoryStore;
    use rcgen::{CertificateParams, KeyPair, SanType};
    use svid_core::AttestationType;
    use svid_plugins::attestors::MockAttestor;
    use svid_plugins::{AttestorSetBuilder, NoopNodeResolver};

    fn csr_for(uri: &str) -> Vec<u8> {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec![]).unwrap();
        params.subject_alt_names = vec![SanType::URI(
            rcgen::string::Ia5String::try_from(uri).unwrap(),
        )];
        params.serialize_request(&key).unwrap().der().to_vec()
    }

    fn service(store: Arc<MemoryStore>) -> NodeService {
        NodeService::new(
            NodeServiceConfig { base_svid_ttl: 120 },
            store,
            Arc::new(SelfSignedCa::new("example.org").unwrap()),
            AttestorSetBuilder::new().with_attestor(MockAttestor::new()).build(),
            Arc::new(NoopNodeResolver),
        )
    }

    #[tokio::test]
    async fn test_base_svid_uses_configured_ttl() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone());
        let node = "spiffe://example.org/node/A";

        let update = service
            .fetch_base_svid(&csr_for(node), &AttestedData::new(AttestationType::Mock, node))
            .await
            .unwrap();

        let svid = &update.svids[&SpiffeId::parse(node).unwrap()];
        assert_eq!(svid.ttl, 120);
        assert_eq!(store.attested_node_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_evidence_is_attestation_error() {
        let service = service(Arc::new(MemoryStore::new()));

        let result = service
            .fetch_base_svid(
                &csr_for("spiffe://example.org/node/A"),
                &AttestedData::new(AttestationType::Mock, "INVALID"),
            )
            .await;

        assert!(matches!(result, Err(NodeError::Attestation(_))));
    }

    #[tokio::test]
    async fn test_unregistered_attestation_type() {
        let service = service(Arc::new(MemoryStore::new()));

        let result = service
            .fetch_base_svid(
                &csr_for("spiffe://example.org/node/A"),
                &AttestedData::new(AttestationType::JoinToken, "abc123"),
            )
            .await;

        assert!(matches!(result, Err(NodeError::Attestation(_))));
    }

    #[tokio::test]
    async fn test_federated_bundle_not_found() {
        let service = service(Arc::new(MemoryStore::new()));

        let result = service.fetch_federated_bundle("partner.org").await;
        assert!(matches!(result, Err(NodeError::NotFound(_))));
    }

    #[test]
    fn test_cp_bundle_comes_from_ca() {
        let service = service(Arc::new(MemoryStore::new()));

        assert_eq!(service.fetch_cp_bundle().len(), 1);
        assert_eq!(service.trust_domain(), "example.org");
    }
}
