//! Domain logic for the zone activity tracker.
//!
//! This crate contains the pure, synchronous core:
//! - Validated identifiers and the [`ZoneRecord`] entity
//! - [`Origin`] decoding from the registry's tagged-string encoding
//! - [`Snapshot`]: an immutable index over one generation of the zone graph
//! - Deterministic tree enumeration and breadcrumb paths

pub mod snapshot;
pub mod tree;
pub mod types;
pub mod zone;

pub use snapshot::Snapshot;
pub use types::{ActivityState, CapabilityId, DeviceId, ValidationError, ZoneId};
pub use zone::{CapabilityReading, Origin, ZoneRecord};
