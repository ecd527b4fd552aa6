//! Breadcrumb paths over the zone tree.

use crate::snapshot::Snapshot;
use crate::types::ZoneId;

/// Separator between zone names in a breadcrumb path.
pub const PATH_SEPARATOR: &str = " > ";

/// Full path of a zone from its root down to itself, e.g.
/// `"Home > First floor > Bedroom"`.
///
/// Returns `None` when the zone is not in the snapshot.
#[must_use]
pub fn path_for_zone(snapshot: &Snapshot, id: &ZoneId) -> Option<String> {
    let zone = snapshot.zone(id)?;
    let mut names: Vec<&str> = snapshot
        .all_parents(id)
        .iter()
        .map(|parent| parent.name.as_str())
        .collect();
    names.reverse();
    names.push(&zone.name);
    Some(names.join(PATH_SEPARATOR))
}

/// Path of a zone's ancestors only, root first. Empty for roots and
/// unknown zones.
#[must_use]
pub fn ancestor_path(snapshot: &Snapshot, id: &ZoneId) -> String {
    let mut names: Vec<&str> = snapshot
        .all_parents(id)
        .iter()
        .map(|parent| parent.name.as_str())
        .collect();
    names.reverse();
    names.join(PATH_SEPARATOR)
}
