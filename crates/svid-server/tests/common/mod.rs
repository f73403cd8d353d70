//! Shared helpers for node service tests

#![allow(dead_code)]

use async_trait::async_trait;
use rcgen::{CertificateParams, KeyPair, SanType};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use svid_core::{
    AttestationType, AttestedData, AttestedNode, RegistrationEntry, Selector, SpiffeId,
};
use svid_plugins::{
    AttestResponse, AttestorSetBuilder, NodeAttestor, NodeResolver, PluginError,
    StaticNodeResolver,
};
use svid_server::{
    CaError, DataStore, MemoryStore, NodeService, NodeServiceConfig, SelfSignedCa, ServerCa,
    StorageError,
};

pub const TRUST_DOMAIN: &str = "example.org";
pub const BASE_SVID_TTL: i32 = 1800;

pub fn id(s: &str) -> SpiffeId {
    SpiffeId::parse(s).unwrap()
}

/// DER CSR with the given URI SANs
pub fn csr_with_uris(uris: &[&str]) -> Vec<u8> {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec![]).unwrap();
    params.subject_alt_names = uris
        .iter()
        .map(|u| SanType::URI(rcgen::string::Ia5String::try_from(*u).unwrap()))
        .collect();
    params.serialize_request(&key).unwrap().der().to_vec()
}

pub fn csr_for(uri: &str) -> Vec<u8> {
    csr_with_uris(&[uri])
}

pub fn mock_evidence() -> AttestedData {
    AttestedData::new(AttestationType::Mock, "scripted")
}

// =============================================================================
// Attestor
// =============================================================================

/// Attestor returning a fixed verdict and recording what it was asked
pub struct ScriptedAttestor {
    response: AttestResponse,
    calls: Mutex<Vec<bool>>,
}

impl ScriptedAttestor {
    pub fn new(response: AttestResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn proving(uri: &str) -> Arc<Self> {
        Self::new(AttestResponse::valid(id(uri)))
    }

    /// `attested_before` flag of every call so far
    pub fn calls(&self) -> Vec<bool> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeAttestor for ScriptedAttestor {
    fn attestation_type(&self) -> AttestationType {
        AttestationType::Mock
    }

    async fn attest(
        &self,
        _data: &AttestedData,
        attested_before: bool,
    ) -> svid_plugins::Result<AttestResponse> {
        self.calls.lock().unwrap().push(attested_before);
        Ok(self.response.clone())
    }
}

// =============================================================================
// CA
// =============================================================================

/// Self-signed CA that counts signatures and can stall or fail
pub struct TestCa {
    inner: SelfSignedCa,
    signed: AtomicUsize,
    delay: Option<Duration>,
    fail: bool,
}

impl TestCa {
    pub fn new() -> Arc<Self> {
        Self::build(None, false)
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(Some(delay), false)
    }

    pub fn failing() -> Arc<Self> {
        Self::build(None, true)
    }

    fn build(delay: Option<Duration>, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            inner: SelfSignedCa::new(TRUST_DOMAIN).unwrap(),
            signed: AtomicUsize::new(0),
            delay,
            fail,
        })
    }

    pub fn signed(&self) -> usize {
        self.signed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerCa for TestCa {
    async fn sign_csr(&self, csr: &[u8]) -> Result<Vec<u8>, CaError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(CaError::Signing("upstream CA unavailable".into()));
        }
        let cert = self.inner.sign_csr(csr).await?;
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(cert)
    }

    fn bundle(&self) -> Vec<Vec<u8>> {
        self.inner.bundle()
    }

    fn trust_domain(&self) -> &str {
        self.inner.trust_domain()
    }
}

// =============================================================================
// Resolver
// =============================================================================

pub struct FailingResolver;

#[async_trait]
impl NodeResolver for FailingResolver {
    async fn resolve(
        &self,
        _spiffe_ids: &[SpiffeId],
    ) -> svid_plugins::Result<HashMap<SpiffeId, Vec<Selector>>> {
        Err(PluginError::Resolution("cloud API timed out".into()))
    }
}

// =============================================================================
// Store
// =============================================================================

/// Memory store whose parent-ID lookups can be made to fail
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_parent_lookup: AtomicBool,
}

#[async_trait]
impl DataStore for FlakyStore {
    async fn fetch_attested_node(
        &self,
        spiffe_id: &SpiffeId,
    ) -> Result<Option<AttestedNode>, StorageError> {
        self.inner.fetch_attested_node(spiffe_id).await
    }

    async fn create_attested_node(
        &self,
        attestation_type: AttestationType,
        spiffe_id: &SpiffeId,
        certificate: &[u8],
    ) -> Result<AttestedNode, StorageError> {
        self.inner
            .create_attested_node(attestation_type, spiffe_id, certificate)
            .await
    }

    async fn update_attested_node(
        &self,
        spiffe_id: &SpiffeId,
        certificate: &[u8],
    ) -> Result<AttestedNode, StorageError> {
        self.inner.update_attested_node(spiffe_id, certificate).await
    }

    async fn create_node_resolver_map_entry(
        &self,
        spiffe_id: &SpiffeId,
        selector: &Selector,
    ) -> Result<(), StorageError> {
        self.inner.create_node_resolver_map_entry(spiffe_id, selector).await
    }

    async fn fetch_node_resolver_map_entries(
        &self,
        spiffe_id: &SpiffeId,
    ) -> Result<Vec<Selector>, StorageError> {
        self.inner.fetch_node_resolver_map_entries(spiffe_id).await
    }

    async fn create_registration_entry(
        &self,
        entry: RegistrationEntry,
    ) -> Result<String, StorageError> {
        self.inner.create_registration_entry(entry).await
    }

    async fn list_selector_entries(
        &self,
        selector: &Selector,
    ) -> Result<Vec<RegistrationEntry>, StorageError> {
        self.inner.list_selector_entries(selector).await
    }

    async fn list_parent_id_entries(
        &self,
        parent_id: &SpiffeId,
    ) -> Result<Vec<RegistrationEntry>, StorageError> {
        if self.fail_parent_lookup.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("connection reset".into()));
        }
        self.inner.list_parent_id_entries(parent_id).await
    }

    async fn set_federated_bundle(
        &self,
        trust_domain: &str,
        certificates: Vec<Vec<u8>>,
    ) -> Result<(), StorageError> {
        self.inner.set_federated_bundle(trust_domain, certificates).await
    }

    async fn fetch_federated_bundle(
        &self,
        trust_domain: &str,
    ) -> Result<Option<Vec<Vec<u8>>>, StorageError> {
        self.inner.fetch_federated_bundle(trust_domain).await
    }
}

// =============================================================================
// Service
// =============================================================================

/// A node service wired to test collaborators
pub struct Harness {
    pub service: NodeService,
    pub store: Arc<MemoryStore>,
    pub ca: Arc<TestCa>,
}

pub fn harness(attestor: Arc<dyn NodeAttestor>) -> Harness {
    harness_with(attestor, TestCa::new(), Arc::new(StaticNodeResolver::new()))
}

pub fn harness_with(
    attestor: Arc<dyn NodeAttestor>,
    ca: Arc<TestCa>,
    resolver: Arc<dyn NodeResolver>,
) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let service = NodeService::new(
        NodeServiceConfig {
            base_svid_ttl: BASE_SVID_TTL,
        },
        store.clone(),
        ca.clone(),
        AttestorSetBuilder::new()
            .with_shared_attestor(attestor)
            .build(),
        resolver,
    );

    Harness { service, store, ca }
}
