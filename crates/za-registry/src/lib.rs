//! External-registry seam for the zone activity tracker.
//!
//! Defines the [`ZoneRegistry`] trait the cache and activity resolver
//! consume, the change-event stream, wire-format decoding, and an in-memory
//! implementation for fixtures and tests.

mod memory;
mod registry;
pub mod wire;

pub use memory::InMemoryRegistry;
pub use registry::{RegistryError, ZoneEvent, ZoneEventKind, ZoneRegistry};
