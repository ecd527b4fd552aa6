//! The registry interface the cache and resolver consume.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use za_core::{CapabilityId, CapabilityReading, DeviceId, ZoneId, ZoneRecord};

/// Errors from the external registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The requested zone does not exist.
    #[error("zone not found: {0}")]
    ZoneNotFound(ZoneId),

    /// The requested device does not exist.
    #[error("device not found: {0}")]
    DeviceNotFound(DeviceId),

    /// The registry could not be reached; transient.
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

/// What happened to a zone in the external registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneEventKind {
    Created,
    Updated,
    Deleted,
}

/// A change notification from the registry's event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneEvent {
    pub kind: ZoneEventKind,
    pub zone_id: ZoneId,
}

/// The external zone/device registry.
///
/// Implementations are expected to be cheap to query repeatedly; the
/// activity walk fetches zones and capability readings live rather than
/// going through the cache, because the timestamps it collects must be
/// fresh.
///
/// Methods return `Send` futures so the cache's watcher task can run on a
/// multi-threaded runtime.
pub trait ZoneRegistry: Send + Sync + 'static {
    /// Fetches the complete flat zone list.
    fn fetch_all_zones(&self)
    -> impl Future<Output = Result<Vec<ZoneRecord>, RegistryError>> + Send;

    /// Fetches a single zone by id.
    fn fetch_zone(
        &self,
        id: &ZoneId,
    ) -> impl Future<Output = Result<ZoneRecord, RegistryError>> + Send;

    /// Fetches a device's current reading for one capability.
    ///
    /// `Ok(None)` means the device exists but does not expose the capability.
    fn fetch_device_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
    ) -> impl Future<Output = Result<Option<CapabilityReading>, RegistryError>> + Send;

    /// Subscribes to the change-notification stream.
    ///
    /// Each call returns a fresh receiver; subscriptions may silently die on
    /// some transports, so consumers re-subscribe periodically.
    fn subscribe(&self) -> broadcast::Receiver<ZoneEvent>;
}
