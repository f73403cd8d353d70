//! Registration entry resolution
//!
//! Entries reach a caller through two paths: selector lookups (entries whose
//! selectors the caller carries) and parent lookups (entries whose parent ID
//! is the caller). The same entry may surface through both.

use std::collections::HashSet;
use tracing::{debug, error};

use svid_core::{CanonicalEntry, RegistrationEntry, Selector, SpiffeId};

use crate::storage::{DataStore, StorageError};

/// Resolve the registration entries a caller is entitled to
///
/// Selector-indexed entries come first, in lookup order, and are kept as-is
/// even when several selectors surface the same entry. Parent-indexed
/// entries follow; one is dropped when an equivalent entry (same fields, same
/// selector set in any order) is already among the selector-indexed ones.
pub async fn resolve_registration_entries(
    store: &dyn DataStore,
    selectors: &[Selector],
    spiffe_id: &SpiffeId,
) -> Result<Vec<RegistrationEntry>, StorageError> {
    let mut entries = Vec::new();
    for selector in selectors {
        let found = store.list_selector_entries(selector).await.map_err(|e| {
            error!(selector = %selector, error = %e, "Failed to list entries by selector");
            e
        })?;
        entries.extend(found);
    }

    let parent_entries = store.list_parent_id_entries(spiffe_id).await.map_err(|e| {
        error!(parent_id = %spiffe_id, error = %e, "Failed to list entries by parent ID");
        e
    })?;

    let seen: HashSet<CanonicalEntry> = entries.iter().map(RegistrationEntry::canonical).collect();
    let selector_count = entries.len();
    entries.extend(
        parent_entries
            .into_iter()
            .filter(|entry| !seen.contains(&entry.canonical())),
    );

    debug!(
        spiffe_id = %spiffe_id,
        selector_entries = selector_count,
        parent_entries = entries.len() - selector_count,
        "Resolved registration entries"
    );

    Ok(entries)
}
