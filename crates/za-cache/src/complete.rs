//! Zone autocomplete candidate generation.
//!
//! Emits the whole tree in the deterministic depth-first order, each entry
//! carrying a breadcrumb of its ancestors, then filters by a
//! case-insensitive substring match on the zone name.

use za_core::{Snapshot, ZoneId, tree};

/// One autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteEntry {
    pub id: ZoneId,
    pub name: String,
    /// Ancestor names, root first, joined with `" > "`. Empty for roots.
    pub description: String,
    pub icon: String,
}

/// Autocomplete candidates for `query`, in tree order.
///
/// An empty query returns every zone.
#[must_use]
pub fn zone_autocomplete(snapshot: &Snapshot, query: &str) -> Vec<AutocompleteEntry> {
    let query = query.to_lowercase();
    snapshot
        .all_zones()
        .into_iter()
        .filter(|zone| zone.name.to_lowercase().contains(&query))
        .map(|zone| AutocompleteEntry {
            id: zone.id.clone(),
            name: zone.name.clone(),
            description: tree::ancestor_path(snapshot, &zone.id),
            icon: zone.icon.clone(),
        })
        .collect()
}
