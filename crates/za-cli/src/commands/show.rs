//! `za parents` and `za children`: structural lookups for one zone.

use anyhow::{Result, bail};

use za_cache::ZoneCache;
use za_core::{ZoneId, tree};
use za_registry::ZoneRegistry;

pub fn parents<R: ZoneRegistry>(cache: &ZoneCache<R>, id: &str) -> Result<()> {
    let id = ZoneId::new(id)?;
    let snapshot = cache.snapshot();
    if snapshot.zone(&id).is_none() {
        bail!("zone not found: {id}");
    }
    for parent in snapshot.all_parents(&id) {
        println!("{}", parent.name);
    }
    Ok(())
}

pub fn children<R: ZoneRegistry>(cache: &ZoneCache<R>, id: &str, direct: bool) -> Result<()> {
    let id = ZoneId::new(id)?;
    let snapshot = cache.snapshot();
    if snapshot.zone(&id).is_none() {
        bail!("zone not found: {id}");
    }
    let zones = if direct {
        snapshot.direct_children(&id)
    } else {
        snapshot.all_children(&id)
    };
    for zone in zones {
        match tree::path_for_zone(&snapshot, &zone.id) {
            Some(path) => println!("{path}"),
            None => println!("{}", zone.name),
        }
    }
    Ok(())
}
