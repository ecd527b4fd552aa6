//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Cache and resolver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound on any single registry fetch, in milliseconds.
    pub fetch_timeout_ms: u64,

    /// How long to wait after a change event before rebuilding, coalescing
    /// bursts into one rebuild. Zero disables debouncing.
    pub debounce_ms: u64,

    /// How often the watcher re-establishes the registry subscription.
    /// Liveness workaround for transports that drop subscriptions silently.
    pub resubscribe_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 10_000,
            debounce_ms: 250,
            resubscribe_interval_secs: 3_600,
        }
    }
}

impl CacheConfig {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ZA_*)
        figment = figment.merge(Env::prefixed("ZA_"));

        figment.extract()
    }

    /// Fetch timeout as a [`Duration`].
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Debounce window as a [`Duration`].
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Re-subscribe interval as a [`Duration`].
    #[must_use]
    pub const fn resubscribe_interval(&self) -> Duration {
        Duration::from_secs(self.resubscribe_interval_secs)
    }
}

/// Returns the platform-specific config directory for za.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("za"))
}
