//! Selectors and selector-set matching
//!
//! A selector is a `(type, value)` pair such as `("unix", "uid:1000")`.
//! The derived `Ord` compares `type` first, then `value`, which gives the
//! total order used to canonicalize selector sets.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A discoverable attribute of a node or workload
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Selector {
    /// Selector namespace (e.g. `k8s`, `unix`, `docker`)
    #[serde(rename = "type")]
    pub selector_type: String,

    /// Selector value within the namespace
    pub value: String,
}

impl Selector {
    /// Create a new selector
    pub fn new(selector_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            selector_type: selector_type.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.selector_type, self.value)
    }
}

impl std::str::FromStr for Selector {
    type Err = CoreError;

    /// Parse `type:value`. Only the first colon separates; values may contain colons.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((selector_type, value)) if !selector_type.is_empty() && !value.is_empty() => {
                Ok(Selector::new(selector_type, value))
            }
            _ => Err(CoreError::InvalidSelector(s.to_string())),
        }
    }
}

/// Return a sorted copy of a selector set
pub fn sorted_selectors(selectors: &[Selector]) -> Vec<Selector> {
    let mut sorted = selectors.to_vec();
    sorted.sort();
    sorted
}

/// Decide whether two selector sets hold the same `(type, value)` pairs,
/// ignoring input order.
///
/// Both sets are sorted and compared element-wise, so repeated pairs must
/// repeat the same number of times on both sides. Entry resolution hashes
/// the same sorted form through `RegistrationEntry::canonical`.
pub fn selectors_match(a: &[Selector], b: &[Selector]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    sorted_selectors(a) == sorted_selectors(b)
}
