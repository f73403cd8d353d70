//! Node Attestation Plugins
//!
//! Plugins the node service calls while bootstrapping an agent:
//!
//! - **Node attestors** verify evidence presented by a node and derive the
//!   base SPIFFE ID the evidence proves. One attestor per
//!   [`AttestationType`](svid_core::AttestationType), grouped in an
//!   [`AttestorSet`].
//! - **Node resolvers** map an attested node's SPIFFE ID to the selectors
//!   that describe it.
//!
//! ## Usage
//!
//! ```ignore
//! use svid_plugins::{AttestorSetBuilder, attestors::JoinTokenAttestor};
//!
//! let attestors = AttestorSetBuilder::new()
//!     .with_attestor(JoinTokenAttestor::new("example.org").with_token("abc123"))
//!     .build();
//!
//! let response = attestors.attest(&attested_data, false).await?;
//! ```

pub mod attestor;
pub mod attestors;
pub mod error;
pub mod resolver;
pub mod types;

pub use attestor::{AttestorSet, AttestorSetBuilder, NodeAttestor};
pub use error::{PluginError, Result};
pub use resolver::{NodeResolver, NoopNodeResolver, StaticNodeResolver};
pub use types::AttestResponse;
