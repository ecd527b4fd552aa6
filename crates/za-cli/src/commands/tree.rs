//! `za tree`: print the whole zone hierarchy.

use std::fmt::Write;

use anyhow::Result;

use za_cache::ZoneCache;
use za_core::Snapshot;
use za_registry::ZoneRegistry;

/// Renders the tree with two-space indentation per level.
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for zone in snapshot.all_zones() {
        let depth = snapshot.all_parents(&zone.id).len();
        let marker = if zone.active { " [active]" } else { "" };
        let _ = writeln!(out, "{}{}{marker}", "  ".repeat(depth), zone.name);
    }
    out
}

pub fn run<R: ZoneRegistry>(cache: &ZoneCache<R>) -> Result<()> {
    print!("{}", render(&cache.snapshot()));
    Ok(())
}
