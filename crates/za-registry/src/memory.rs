//! An in-process registry implementation.
//!
//! Backs the CLI's fixture mode and the test suites. Mutation helpers emit
//! change events on the same broadcast stream a real registry transport
//! would, so cache behavior can be exercised end to end.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;
use uuid::Uuid;

use za_core::{CapabilityId, CapabilityReading, DeviceId, ZoneId, ZoneRecord};

use crate::registry::{RegistryError, ZoneEvent, ZoneEventKind, ZoneRegistry};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct State {
    zones: HashMap<ZoneId, ZoneRecord>,
    capabilities: HashMap<(DeviceId, CapabilityId), CapabilityReading>,
    /// When false, fetches fail with [`RegistryError::Unavailable`].
    unreachable: bool,
}

/// An in-memory zone/device registry.
#[derive(Debug)]
pub struct InMemoryRegistry {
    state: RwLock<State>,
    events: broadcast::Sender<ZoneEvent>,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(State::default()),
            events,
        }
    }

    /// Creates a registry pre-populated with zones.
    #[must_use]
    pub fn with_zones(zones: impl IntoIterator<Item = ZoneRecord>) -> Self {
        let registry = Self::new();
        {
            let mut state = registry.write();
            for zone in zones {
                state.zones.insert(zone.id.clone(), zone);
            }
        }
        registry
    }

    /// Creates a zone with a generated id and emits a `Created` event.
    pub fn create_zone(&self, name: impl Into<String>, parent: Option<ZoneId>) -> ZoneId {
        let id = ZoneId::new(Uuid::new_v4().to_string()).expect("generated UUID is non-empty");
        let record = ZoneRecord {
            id: id.clone(),
            name: name.into(),
            parent,
            icon: String::new(),
            active: false,
            active_last_updated: None,
            active_origins: Vec::new(),
        };
        self.write().zones.insert(id.clone(), record);
        self.emit(ZoneEventKind::Created, id.clone());
        id
    }

    /// Inserts or replaces a zone and emits `Created` or `Updated`.
    pub fn upsert_zone(&self, zone: ZoneRecord) {
        let id = zone.id.clone();
        let replaced = self.write().zones.insert(id.clone(), zone).is_some();
        let kind = if replaced {
            ZoneEventKind::Updated
        } else {
            ZoneEventKind::Created
        };
        self.emit(kind, id);
    }

    /// Removes a zone and emits `Deleted` if it existed.
    pub fn remove_zone(&self, id: &ZoneId) {
        let removed = self.write().zones.remove(id).is_some();
        if removed {
            self.emit(ZoneEventKind::Deleted, id.clone());
        }
    }

    /// Replaces the whole zone set, emitting `Updated` for every new zone.
    pub fn replace_zones(&self, zones: impl IntoIterator<Item = ZoneRecord>) {
        let ids: Vec<ZoneId> = {
            let mut state = self.write();
            state.zones = zones
                .into_iter()
                .map(|zone| (zone.id.clone(), zone))
                .collect();
            state.zones.keys().cloned().collect()
        };
        for id in ids {
            self.emit(ZoneEventKind::Updated, id);
        }
    }

    /// Replaces the whole zone set without emitting events, as when changes
    /// happen while no live subscription is around to carry them.
    pub fn replace_zones_silently(&self, zones: impl IntoIterator<Item = ZoneRecord>) {
        self.write().zones = zones
            .into_iter()
            .map(|zone| (zone.id.clone(), zone))
            .collect();
    }

    /// Sets a device capability reading.
    pub fn set_capability(
        &self,
        device_id: DeviceId,
        capability_id: CapabilityId,
        reading: CapabilityReading,
    ) {
        self.write()
            .capabilities
            .insert((device_id, capability_id), reading);
    }

    /// Simulates the registry becoming unreachable (or reachable again).
    pub fn set_unreachable(&self, unreachable: bool) {
        self.write().unreachable = unreachable;
    }

    fn emit(&self, kind: ZoneEventKind, zone_id: ZoneId) {
        // Send only fails when nobody is subscribed, which is fine.
        let _ = self.events.send(ZoneEvent { kind, zone_id });
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_reachable(&self) -> Result<(), RegistryError> {
        if self.read().unreachable {
            return Err(RegistryError::Unavailable(
                "simulated registry outage".to_string(),
            ));
        }
        Ok(())
    }
}

impl ZoneRegistry for InMemoryRegistry {
    async fn fetch_all_zones(&self) -> Result<Vec<ZoneRecord>, RegistryError> {
        self.check_reachable()?;
        Ok(self.read().zones.values().cloned().collect())
    }

    async fn fetch_zone(&self, id: &ZoneId) -> Result<ZoneRecord, RegistryError> {
        self.check_reachable()?;
        self.read()
            .zones
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::ZoneNotFound(id.clone()))
    }

    async fn fetch_device_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
    ) -> Result<Option<CapabilityReading>, RegistryError> {
        self.check_reachable()?;
        Ok(self
            .read()
            .capabilities
            .get(&(device_id.clone(), capability_id.clone()))
            .cloned())
    }

    fn subscribe(&self) -> broadcast::Receiver<ZoneEvent> {
        self.events.subscribe()
    }
}
