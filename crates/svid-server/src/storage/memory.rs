//! In-memory storage backend
//!
//! Default storage implementation using in-memory maps.
//! Suitable for development and single-instance deployments.
//! Data is lost on restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

use svid_core::{AttestationType, AttestedNode, RegistrationEntry, Selector, SpiffeId};

use super::{DataStore, StorageError};

/// In-memory data store implementation
#[derive(Debug)]
pub struct MemoryStore {
    attested_nodes: RwLock<HashMap<SpiffeId, AttestedNode>>,
    node_resolver_map: RwLock<HashMap<SpiffeId, Vec<Selector>>>,
    // Vec keeps listing order stable
    registration_entries: RwLock<Vec<RegistrationEntry>>,
    federated_bundles: RwLock<HashMap<String, Vec<Vec<u8>>>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            attested_nodes: RwLock::new(HashMap::new()),
            node_resolver_map: RwLock::new(HashMap::new()),
            registration_entries: RwLock::new(Vec::new()),
            federated_bundles: RwLock::new(HashMap::new()),
        }
    }

    /// Number of attested nodes
    pub fn attested_node_count(&self) -> usize {
        self.attested_nodes.read().unwrap().len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    // =========================================================================
    // Attested Nodes
    // =========================================================================

    async fn fetch_attested_node(
        &self,
        spiffe_id: &SpiffeId,
    ) -> Result<Option<AttestedNode>, StorageError> {
        let nodes = self.attested_nodes.read().unwrap();
        Ok(nodes.get(spiffe_id).cloned())
    }

    async fn create_attested_node(
        &self,
        attestation_type: AttestationType,
        spiffe_id: &SpiffeId,
        certificate: &[u8],
    ) -> Result<AttestedNode, StorageError> {
        let mut nodes = self.attested_nodes.write().unwrap();
        if nodes.contains_key(spiffe_id) {
            return Err(StorageError::AlreadyExists(spiffe_id.to_string()));
        }

        let now = Utc::now();
        let node = AttestedNode {
            spiffe_id: spiffe_id.clone(),
            attestation_type,
            certificate: certificate.to_vec(),
            attested_at: now,
            updated_at: now,
        };
        info!(spiffe_id = %spiffe_id, attestation_type = %attestation_type, "Created attested node");
        nodes.insert(spiffe_id.clone(), node.clone());
        Ok(node)
    }

    async fn update_attested_node(
        &self,
        spiffe_id: &SpiffeId,
        certificate: &[u8],
    ) -> Result<AttestedNode, StorageError> {
        let mut nodes = self.attested_nodes.write().unwrap();
        let node = nodes
            .get_mut(spiffe_id)
            .ok_or_else(|| StorageError::NotFound(spiffe_id.to_string()))?;

        node.certificate = certificate.to_vec();
        node.updated_at = Utc::now();
        info!(spiffe_id = %spiffe_id, "Updated attested node certificate");
        Ok(node.clone())
    }

    // =========================================================================
    // Node Resolver Map
    // =========================================================================

    async fn create_node_resolver_map_entry(
        &self,
        spiffe_id: &SpiffeId,
        selector: &Selector,
    ) -> Result<(), StorageError> {
        let mut map = self.node_resolver_map.write().unwrap();
        let selectors = map.entry(spiffe_id.clone()).or_default();
        if !selectors.contains(selector) {
            selectors.push(selector.clone());
        }
        Ok(())
    }

    async fn fetch_node_resolver_map_entries(
        &self,
        spiffe_id: &SpiffeId,
    ) -> Result<Vec<Selector>, StorageError> {
        let map = self.node_resolver_map.read().unwrap();
        Ok(map.get(spiffe_id).cloned().unwrap_or_default())
    }

    // =========================================================================
    // Registration Entries
    // =========================================================================

    async fn create_registration_entry(
        &self,
        mut entry: RegistrationEntry,
    ) -> Result<String, StorageError> {
        let entry_id = uuid::Uuid::new_v4().to_string();
        entry.entry_id = Some(entry_id.clone());

        let mut entries = self.registration_entries.write().unwrap();
        info!(
            entry_id = %entry_id,
            spiffe_id = %entry.spiffe_id,
            parent_id = %entry.parent_id,
            "Created registration entry"
        );
        entries.push(entry);
        Ok(entry_id)
    }

    async fn list_selector_entries(
        &self,
        selector: &Selector,
    ) -> Result<Vec<RegistrationEntry>, StorageError> {
        let entries = self.registration_entries.read().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.selectors.contains(selector))
            .cloned()
            .collect())
    }

    async fn list_parent_id_entries(
        &self,
        parent_id: &SpiffeId,
    ) -> Result<Vec<RegistrationEntry>, StorageError> {
        let entries = self.registration_entries.read().unwrap();
        Ok(entries
            .iter()
            .filter(|e| &e.parent_id == parent_id)
            .cloned()
            .collect())
    }

    // =========================================================================
    // Federated Bundles
    // =========================================================================

    async fn set_federated_bundle(
        &self,
        trust_domain: &str,
        certificates: Vec<Vec<u8>>,
    ) -> Result<(), StorageError> {
        let mut bundles = self.federated_bundles.write().unwrap();
        info!(trust_domain = %trust_domain, certs = certificates.len(), "Stored federated bundle");
        bundles.insert(trust_domain.to_string(), certificates);
        Ok(())
    }

    async fn fetch_federated_bundle(
        &self,
        trust_domain: &str,
    ) -> Result<Option<Vec<Vec<u8>>>, StorageError> {
        let bundles = self.federated_bundles.read().unwrap();
        Ok(bundles.get(trust_domain).cloned())
    }
}
