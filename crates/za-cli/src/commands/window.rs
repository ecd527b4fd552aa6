//! `za window`: evaluate a continuous-activity window.

use anyhow::{Context, Result};

use za_cache::ActivityResolver;
use za_core::{ActivityState, ZoneId};
use za_registry::ZoneRegistry;

pub async fn run<R: ZoneRegistry>(
    resolver: &ActivityResolver<R>,
    id: &str,
    minutes: u32,
    state: &str,
) -> Result<()> {
    let id = ZoneId::new(id)?;
    let state: ActivityState = state.parse()?;
    let satisfied = resolver
        .is_window_satisfied(&id, minutes, state)
        .await
        .context("failed to evaluate activity window")?;
    println!("{satisfied}");
    Ok(())
}
