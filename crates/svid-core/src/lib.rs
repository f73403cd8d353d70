//! # SVID Core
//!
//! Shared types for the SVID node service: SPIFFE identities, selectors,
//! registration entries and the identity-update payload returned to agents.
//!
//! ## Key Concepts
//!
//! - **SPIFFE ID**: URI naming a node or workload in a trust domain
//! - **Selector**: a discoverable `type:value` attribute of an identity
//! - **Registration Entry**: template binding selectors and/or a parent ID to
//!   a child SPIFFE ID and TTL
//! - **SVID Update**: signed certificates keyed by SPIFFE ID plus the full
//!   set of registration entries the caller is entitled to
//!
//! ## Matching
//!
//! Selector sets are unordered. Two sets match iff they hold the same
//! `(type, value)` pairs, which is decided on a canonical (sorted) form.

pub mod csr;
pub mod entry;
pub mod error;
pub mod selector;
pub mod types;

pub use csr::{spiffe_id_from_csr, verify_csr_signature};
pub use entry::{CanonicalEntry, RegistrationEntry};
pub use error::{CoreError, Result};
pub use selector::{selectors_match, sorted_selectors, Selector};
pub use types::{
    AttestationType, AttestedData, AttestedNode, SpiffeId, Svid, SvidUpdate,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
