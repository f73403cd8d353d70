//! Core logic of the node service

mod entries;
mod error;
mod service;

pub use entries::resolve_registration_entries;
pub use error::{NodeError, Result};
pub use service::{NodeService, NodeServiceConfig, DEFAULT_BASE_SVID_TTL};
