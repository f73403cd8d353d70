//! Storage abstraction for the node service
//!
//! This module provides a trait-based abstraction over the data the node
//! service reads and writes, with in-memory (default) and persistent
//! (PostgreSQL) backends.
//!
//! Backends hold:
//! - Attested-node records (one per node SPIFFE ID)
//! - The node resolver map (selectors resolved for each attested node)
//! - Registration entries (read-only to the node service)
//! - Trust bundles of federated trust domains

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use async_trait::async_trait;
use std::fmt::Debug;

use svid_core::{AttestationType, AttestedNode, RegistrationEntry, Selector, SpiffeId};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Storage backend trait for node service state
///
/// Implementations must be thread-safe and support concurrent access.
/// Creates and updates of the same attested node must be linearizable.
#[async_trait]
pub trait DataStore: Send + Sync + Debug {
    // =========================================================================
    // Attested Nodes
    // =========================================================================

    /// Get the attested-node record for a SPIFFE ID
    async fn fetch_attested_node(
        &self,
        spiffe_id: &SpiffeId,
    ) -> Result<Option<AttestedNode>, StorageError>;

    /// Record a node's first successful attestation
    ///
    /// Fails with `AlreadyExists` if the node already has a record.
    async fn create_attested_node(
        &self,
        attestation_type: AttestationType,
        spiffe_id: &SpiffeId,
        certificate: &[u8],
    ) -> Result<AttestedNode, StorageError>;

    /// Replace the certificate of an existing record
    ///
    /// The attestation type is never changed. Fails with `NotFound` if the
    /// node has no record.
    async fn update_attested_node(
        &self,
        spiffe_id: &SpiffeId,
        certificate: &[u8],
    ) -> Result<AttestedNode, StorageError>;

    // =========================================================================
    // Node Resolver Map
    // =========================================================================

    /// Map a selector to a node. Re-adding an existing pair is a no-op.
    async fn create_node_resolver_map_entry(
        &self,
        spiffe_id: &SpiffeId,
        selector: &Selector,
    ) -> Result<(), StorageError>;

    /// Selectors mapped to a node, in insertion order
    async fn fetch_node_resolver_map_entries(
        &self,
        spiffe_id: &SpiffeId,
    ) -> Result<Vec<Selector>, StorageError>;

    // =========================================================================
    // Registration Entries
    // =========================================================================

    /// Store a registration entry and return its assigned ID
    async fn create_registration_entry(
        &self,
        entry: RegistrationEntry,
    ) -> Result<String, StorageError>;

    /// Entries whose selector set contains `selector`, in insertion order
    async fn list_selector_entries(
        &self,
        selector: &Selector,
    ) -> Result<Vec<RegistrationEntry>, StorageError>;

    /// Entries whose parent ID is `parent_id`, in insertion order
    async fn list_parent_id_entries(
        &self,
        parent_id: &SpiffeId,
    ) -> Result<Vec<RegistrationEntry>, StorageError>;

    // =========================================================================
    // Federated Bundles
    // =========================================================================

    /// Store (or replace) the CA certificates of a federated trust domain
    async fn set_federated_bundle(
        &self,
        trust_domain: &str,
        certificates: Vec<Vec<u8>>,
    ) -> Result<(), StorageError>;

    /// CA certificates of a federated trust domain
    async fn fetch_federated_bundle(
        &self,
        trust_domain: &str,
    ) -> Result<Option<Vec<Vec<u8>>>, StorageError>;
}
