//! Node resolvers
//!
//! A node resolver describes an attested node with selectors (e.g. the
//! cloud instance tags of the machine it runs on).

use async_trait::async_trait;
use std::collections::HashMap;

use svid_core::{Selector, SpiffeId};

use crate::error::Result;

/// Trait for node resolvers
#[async_trait]
pub trait NodeResolver: Send + Sync {
    /// Resolve selectors for each ID
    ///
    /// IDs the resolver knows nothing about are simply absent from the map.
    async fn resolve(&self, spiffe_ids: &[SpiffeId]) -> Result<HashMap<SpiffeId, Vec<Selector>>>;

    fn description(&self) -> &str {
        "node resolver"
    }
}

/// Resolver that never produces selectors
#[derive(Debug, Default)]
pub struct NoopNodeResolver;

#[async_trait]
impl NodeResolver for NoopNodeResolver {
    async fn resolve(&self, _spiffe_ids: &[SpiffeId]) -> Result<HashMap<SpiffeId, Vec<Selector>>> {
        Ok(HashMap::new())
    }

    fn description(&self) -> &str {
        "noop node resolver"
    }
}

/// Resolver backed by a fixed ID → selectors table
#[derive(Debug, Default, Clone)]
pub struct StaticNodeResolver {
    selectors: HashMap<SpiffeId, Vec<Selector>>,
}

impl StaticNodeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach selectors to an ID
    pub fn with_selectors(
        mut self,
        spiffe_id: SpiffeId,
        selectors: impl IntoIterator<Item = Selector>,
    ) -> Self {
        self.selectors.entry(spiffe_id).or_default().extend(selectors);
        self
    }
}

#[async_trait]
impl NodeResolver for StaticNodeResolver {
    async fn resolve(&self, spiffe_ids: &[SpiffeId]) -> Result<HashMap<SpiffeId, Vec<Selector>>> {
        Ok(spiffe_ids
            .iter()
            .filter_map(|id| self.selectors.get(id).map(|s| (id.clone(), s.clone())))
            .collect())
    }

    fn description(&self) -> &str {
        "static node resolver"
    }
}
