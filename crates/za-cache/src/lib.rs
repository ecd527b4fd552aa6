//! Zone hierarchy cache and activity window evaluation.
//!
//! This crate holds the async service layer:
//! - [`ZoneCache`]: an atomically-swapped mirror of the external zone graph
//! - [`ActivityResolver`]: continuous active/inactive window checks over the
//!   live registry, tracing nested activity origins
//! - Autocomplete candidate generation over a cache snapshot

mod activity;
mod cache;
mod complete;
mod config;
mod error;

pub use activity::ActivityResolver;
pub use cache::{WatcherHandle, ZoneCache};
pub use complete::{AutocompleteEntry, zone_autocomplete};
pub use config::CacheConfig;
pub use error::CacheError;
