//! Registration entries and their canonical form

use serde::{Deserialize, Serialize};

use crate::selector::{selectors_match, sorted_selectors, Selector};
use crate::types::SpiffeId;

/// Template declaring which SPIFFE ID a selector set and/or parent may receive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEntry {
    /// Store-assigned identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,

    /// Selectors a caller must present
    pub selectors: Vec<Selector>,

    /// SPIFFE ID of the node or workload allowed to request this identity
    pub parent_id: SpiffeId,

    /// SPIFFE ID granted by this entry
    pub spiffe_id: SpiffeId,

    /// SVID time to live in seconds
    pub ttl: i32,

    /// Trust domains whose bundles the holder should receive
    #[serde(default)]
    pub federates_with: Vec<String>,
}

impl RegistrationEntry {
    /// Create a new entry with no selectors
    pub fn new(parent_id: SpiffeId, spiffe_id: SpiffeId, ttl: i32) -> Self {
        Self {
            entry_id: None,
            selectors: Vec::new(),
            parent_id,
            spiffe_id,
            ttl,
            federates_with: Vec::new(),
        }
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selectors.push(selector);
        self
    }

    pub fn with_selectors(mut self, selectors: impl IntoIterator<Item = Selector>) -> Self {
        self.selectors.extend(selectors);
        self
    }

    pub fn with_entry_id(mut self, entry_id: impl Into<String>) -> Self {
        self.entry_id = Some(entry_id.into());
        self
    }

    pub fn federates_with(mut self, trust_domain: impl Into<String>) -> Self {
        self.federates_with.push(trust_domain.into());
        self
    }

    /// Canonical form used to detect equivalent entries
    pub fn canonical(&self) -> CanonicalEntry {
        CanonicalEntry {
            entry_id: self.entry_id.clone(),
            selectors: sorted_selectors(&self.selectors),
            parent_id: self.parent_id.clone(),
            spiffe_id: self.spiffe_id.clone(),
            ttl: self.ttl,
            federates_with: self.federates_with.clone(),
        }
    }

    /// Two entries are equivalent iff their selector sets are set-equal and
    /// every other field matches exactly.
    ///
    /// Pairwise form of comparing [`canonical`](Self::canonical) keys; entry
    /// resolution hashes the canonical key instead of calling this.
    pub fn is_equivalent(&self, other: &RegistrationEntry) -> bool {
        self.entry_id == other.entry_id
            && self.parent_id == other.parent_id
            && self.spiffe_id == other.spiffe_id
            && self.ttl == other.ttl
            && self.federates_with == other.federates_with
            && selectors_match(&self.selectors, &other.selectors)
    }
}

/// A registration entry with its selectors in sorted order
///
/// Equal canonical entries are equivalent registration entries, so this is
/// the key used for hash-based deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalEntry {
    entry_id: Option<String>,
    selectors: Vec<Selector>,
    parent_id: SpiffeId,
    spiffe_id: SpiffeId,
    ttl: i32,
    federates_with: Vec<String>,
}
