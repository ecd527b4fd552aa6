use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use za_cache::{ActivityResolver, CacheConfig, ZoneCache};
use za_cli::commands::{complete, show, tree, window};
use za_cli::{Cli, Commands};
use za_registry::{InMemoryRegistry, wire};

/// Loads the zone-graph fixture into an in-memory registry.
fn load_registry(zones_path: &Path) -> Result<Arc<InMemoryRegistry>> {
    let data = std::fs::read_to_string(zones_path)
        .with_context(|| format!("failed to read zone file {}", zones_path.display()))?;
    let zones = wire::zones_from_json(&data).context("failed to parse zone file")?;
    tracing::debug!(zones = zones.len(), "loaded zone fixture");
    Ok(Arc::new(InMemoryRegistry::with_zones(zones)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let zones_path = cli
        .zones
        .clone()
        .context("--zones <FILE> is required for this command")?;
    let config = CacheConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let registry = load_registry(&zones_path)?;
    let cache = ZoneCache::initialize(Arc::clone(&registry), config.clone())
        .await
        .context("failed to build zone cache")?;

    match command {
        Commands::Tree => tree::run(&cache)?,
        Commands::Parents { id } => show::parents(&cache, id)?,
        Commands::Children { id, direct } => show::children(&cache, id, *direct)?,
        Commands::Window { id, minutes, state } => {
            let resolver = ActivityResolver::new(registry, &config);
            window::run(&resolver, id, *minutes, state).await?;
        }
        Commands::Complete { query } => complete::run(&cache, query)?,
    }

    Ok(())
}
