//! Immutable, internally-consistent materializations of the zone graph.
//!
//! A [`Snapshot`] is built wholesale from the flat zone list the registry
//! returns and is never mutated afterwards. The cache publishes a new
//! snapshot per rebuild; readers either see the previous one or the next
//! one, never a mix.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::types::ZoneId;
use crate::zone::ZoneRecord;

/// An immutable index over one generation of the zone graph.
///
/// Holds the zones themselves plus two derived indices: the ancestor chain of
/// every zone (nearest first) and the direct children of every parent. Both
/// are computed once during [`Snapshot::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    zones_by_id: HashMap<ZoneId, ZoneRecord>,
    parent_chain_by_id: HashMap<ZoneId, Vec<ZoneId>>,
    children_by_parent: HashMap<ZoneId, Vec<ZoneId>>,
    taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// Builds a snapshot from the registry's flat zone list.
    ///
    /// Duplicate ids keep the last occurrence. Parent links that point at a
    /// missing zone make the child a root for enumeration purposes. Parent
    /// cycles terminate the ancestor walk at the first repeated id.
    #[must_use]
    pub fn build(zones: Vec<ZoneRecord>, taken_at: DateTime<Utc>) -> Self {
        let mut zones_by_id: HashMap<ZoneId, ZoneRecord> = HashMap::with_capacity(zones.len());
        for zone in zones {
            if zones_by_id.insert(zone.id.clone(), zone).is_some() {
                tracing::warn!("duplicate zone id in registry response, keeping last");
            }
        }

        let mut parent_chain_by_id: HashMap<ZoneId, Vec<ZoneId>> =
            HashMap::with_capacity(zones_by_id.len());
        let mut children_by_parent: HashMap<ZoneId, Vec<ZoneId>> = HashMap::new();

        for zone in zones_by_id.values() {
            parent_chain_by_id.insert(zone.id.clone(), ancestor_chain(&zones_by_id, zone));
            // A parent missing from the fetched set makes the child a root;
            // the index only ever references zones that exist.
            if let Some(parent) = zone.parent.as_ref().filter(|p| zones_by_id.contains_key(*p)) {
                children_by_parent
                    .entry(parent.clone())
                    .or_default()
                    .push(zone.id.clone());
            }
        }

        // Child lists are kept name-sorted so every traversal is deterministic.
        for children in children_by_parent.values_mut() {
            sort_by_name(&zones_by_id, children);
        }

        Self {
            zones_by_id,
            parent_chain_by_id,
            children_by_parent,
            taken_at,
        }
    }

    /// An empty snapshot, useful as a neutral starting point in tests.
    #[must_use]
    pub fn empty(taken_at: DateTime<Utc>) -> Self {
        Self::build(Vec::new(), taken_at)
    }

    /// When this snapshot was built.
    #[must_use]
    pub const fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Number of zones in this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones_by_id.len()
    }

    /// Whether this snapshot holds no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones_by_id.is_empty()
    }

    /// Looks up a single zone.
    #[must_use]
    pub fn zone(&self, id: &ZoneId) -> Option<&ZoneRecord> {
        self.zones_by_id.get(id)
    }

    /// Looks up several zones, silently dropping ids that are not present.
    #[must_use]
    pub fn zones(&self, ids: &[ZoneId]) -> Vec<&ZoneRecord> {
        ids.iter().filter_map(|id| self.zones_by_id.get(id)).collect()
    }

    /// The full tree in pre-order: roots name-sorted, children name-sorted
    /// at every level.
    #[must_use]
    pub fn all_zones(&self) -> Vec<&ZoneRecord> {
        let mut ordered = Vec::with_capacity(self.zones_by_id.len());
        let mut visited = HashSet::new();
        for root in self.roots() {
            self.push_subtree(&root, &mut ordered, &mut visited);
        }
        ordered
    }

    /// All ancestors of a zone, nearest first.
    ///
    /// Empty when the zone is a root or unknown.
    #[must_use]
    pub fn all_parents(&self, id: &ZoneId) -> Vec<&ZoneRecord> {
        self.parent_chain_by_id
            .get(id)
            .map(|chain| self.zones(chain))
            .unwrap_or_default()
    }

    /// All descendants of a zone in pre-order, each level name-sorted.
    #[must_use]
    pub fn all_children(&self, id: &ZoneId) -> Vec<&ZoneRecord> {
        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(id.clone());
        for child in self.direct_child_ids(id) {
            self.push_subtree(child, &mut ordered, &mut visited);
        }
        ordered
    }

    /// Immediate children of a zone, name-sorted.
    #[must_use]
    pub fn direct_children(&self, id: &ZoneId) -> Vec<&ZoneRecord> {
        self.zones(self.direct_child_ids(id))
    }

    /// Root zones (no parent, or a parent missing from this snapshot),
    /// name-sorted.
    #[must_use]
    pub fn roots(&self) -> Vec<ZoneId> {
        let mut roots: Vec<ZoneId> = self
            .zones_by_id
            .values()
            .filter(|zone| {
                zone.parent
                    .as_ref()
                    .is_none_or(|parent| !self.zones_by_id.contains_key(parent))
            })
            .map(|zone| zone.id.clone())
            .collect();
        sort_by_name(&self.zones_by_id, &mut roots);
        roots
    }

    fn direct_child_ids(&self, id: &ZoneId) -> &[ZoneId] {
        self.children_by_parent.get(id).map_or(&[], Vec::as_slice)
    }

    /// Appends `id` and its whole subtree in pre-order. The visited set
    /// guards against malformed graphs repeating a zone.
    fn push_subtree<'a>(
        &'a self,
        id: &ZoneId,
        ordered: &mut Vec<&'a ZoneRecord>,
        visited: &mut HashSet<ZoneId>,
    ) {
        if !visited.insert(id.clone()) {
            return;
        }
        let Some(zone) = self.zones_by_id.get(id) else {
            return;
        };
        ordered.push(zone);
        for child in self.direct_child_ids(id) {
            self.push_subtree(child, ordered, visited);
        }
    }
}

/// Walks `parent` links to collect the ancestor chain, nearest first.
///
/// Stops on a missing parent or on the first repeated id, so a cyclic graph
/// yields a finite chain instead of looping forever.
fn ancestor_chain(zones_by_id: &HashMap<ZoneId, ZoneRecord>, zone: &ZoneRecord) -> Vec<ZoneId> {
    let mut chain = Vec::new();
    let mut seen: HashSet<&ZoneId> = HashSet::new();
    seen.insert(&zone.id);

    let mut current = zone;
    while let Some(parent_id) = &current.parent {
        if !seen.insert(parent_id) {
            tracing::warn!(zone = %zone.id, repeated = %parent_id, "parent cycle detected, truncating chain");
            break;
        }
        match zones_by_id.get(parent_id) {
            Some(parent) => {
                chain.push(parent.id.clone());
                current = parent;
            }
            None => break,
        }
    }
    chain
}

/// Sorts zone ids by display name (case-sensitive), ties broken by id.
fn sort_by_name(zones_by_id: &HashMap<ZoneId, ZoneRecord>, ids: &mut [ZoneId]) {
    ids.sort_by(|a, b| {
        let name_a = zones_by_id.get(a).map_or("", |z| z.name.as_str());
        let name_b = zones_by_id.get(b).map_or("", |z| z.name.as_str());
        name_a.cmp(name_b).then_with(|| a.cmp(b))
    });
}
