//! SVID Server
//!
//! Node attestation and SVID issuance service:
//! - Attests a node's claimed identity and issues its base SVID
//! - Records the node's attested state and resolved selectors
//! - Signs workload CSRs the caller is entitled to
//! - Resolves registration entries through selector and parent lookups
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check with trust domain and attestors
//! - `POST /v1/node/base-svid` - Bootstrap a node with CSR and evidence
//! - `POST /v1/node/svid` - Sign CSRs for an attested caller
//! - `GET /v1/node/bundle` - Trust bundle of this trust domain
//! - `GET /v1/node/federated-bundle/{trust_domain}` - Bundle of a federated trust domain

pub mod api;
pub mod ca;
pub mod config;
pub mod core;
pub mod storage;

pub use api::create_router;
pub use api::handlers::AppState;
pub use ca::{CaError, SelfSignedCa, ServerCa};
pub use config::{ConfigError, ServerConfig};
pub use crate::core::{NodeError, NodeService, NodeServiceConfig};
pub use storage::{DataStore, MemoryStore, StorageError};
