//! `za complete`: list autocomplete candidates.

use std::fmt::Write;

use anyhow::Result;

use za_cache::{ZoneCache, zone_autocomplete};
use za_core::Snapshot;
use za_registry::ZoneRegistry;

/// Renders candidates as `name (breadcrumb)` lines.
pub fn render(snapshot: &Snapshot, query: &str) -> String {
    let mut out = String::new();
    for entry in zone_autocomplete(snapshot, query) {
        if entry.description.is_empty() {
            let _ = writeln!(out, "{}", entry.name);
        } else {
            let _ = writeln!(out, "{} ({})", entry.name, entry.description);
        }
    }
    out
}

pub fn run<R: ZoneRegistry>(cache: &ZoneCache<R>, query: &str) -> Result<()> {
    print!("{}", render(&cache.snapshot(), query));
    Ok(())
}
