//! Cache rebuild, watcher, and consistency tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;

use za_cache::{CacheConfig, CacheError, ZoneCache};
use za_core::{CapabilityId, CapabilityReading, DeviceId, ZoneId, ZoneRecord};
use za_registry::{InMemoryRegistry, RegistryError, ZoneEvent, ZoneRegistry};

fn id(s: &str) -> ZoneId {
    ZoneId::new(s).unwrap()
}

fn zone(id_: &str, name: &str, parent: Option<&str>) -> ZoneRecord {
    ZoneRecord {
        id: id(id_),
        name: name.to_string(),
        parent: parent.map(|p| ZoneId::new(p).unwrap()),
        icon: String::new(),
        active: false,
        active_last_updated: None,
        active_origins: Vec::new(),
    }
}

fn test_config() -> CacheConfig {
    CacheConfig {
        fetch_timeout_ms: 1_000,
        debounce_ms: 10,
        resubscribe_interval_secs: 3_600,
    }
}

fn names(zones: &[ZoneRecord]) -> Vec<String> {
    zones.iter().map(|z| z.name.clone()).collect()
}

#[tokio::test]
async fn initialize_builds_a_queryable_snapshot() {
    let registry = Arc::new(InMemoryRegistry::with_zones([
        zone("h", "Home", None),
        zone("k", "Kitchen", Some("h")),
    ]));
    let cache = ZoneCache::initialize(registry, test_config()).await.unwrap();

    assert_eq!(names(&cache.all_zones()), ["Home", "Kitchen"]);
    assert_eq!(names(&cache.direct_children(&id("h"))), ["Kitchen"]);
    assert_eq!(names(&cache.all_parents(&id("k"))), ["Home"]);
    assert!(cache.zone(&id("ghost")).is_none());
}

#[tokio::test]
async fn initialize_fails_when_registry_is_unreachable() {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.set_unreachable(true);

    let result = ZoneCache::initialize(registry, test_config()).await;
    assert!(matches!(result, Err(CacheError::Registry(_))));
}

#[tokio::test]
async fn failed_rebuild_keeps_the_previous_snapshot() {
    let registry = Arc::new(InMemoryRegistry::with_zones([zone("h", "Home", None)]));
    let cache = ZoneCache::initialize(Arc::clone(&registry), test_config())
        .await
        .unwrap();

    registry.upsert_zone(zone("k", "Kitchen", Some("h")));
    registry.set_unreachable(true);

    let result = cache.rebuild().await;
    assert!(result.is_err());
    // Stale but consistent: the pre-failure snapshot is still served.
    assert_eq!(names(&cache.all_zones()), ["Home"]);

    registry.set_unreachable(false);
    cache.rebuild().await.unwrap();
    assert_eq!(names(&cache.all_zones()), ["Home", "Kitchen"]);
}

#[tokio::test]
async fn rebuild_is_idempotent_for_an_unchanged_source() {
    let registry = Arc::new(InMemoryRegistry::with_zones([
        zone("h", "Home", None),
        zone("k", "Kitchen", Some("h")),
        zone("b", "Bedroom", Some("h")),
    ]));
    let cache = ZoneCache::initialize(Arc::clone(&registry), test_config())
        .await
        .unwrap();

    let before = cache.all_zones();
    let first_taken = cache.last_updated();
    cache.rebuild().await.unwrap();

    assert_eq!(cache.all_zones(), before);
    assert!(cache.last_updated() >= first_taken);
}

#[tokio::test]
async fn watcher_rebuilds_on_change_events() {
    let registry = Arc::new(InMemoryRegistry::with_zones([zone("h", "Home", None)]));
    let cache = ZoneCache::initialize(Arc::clone(&registry), test_config())
        .await
        .unwrap();
    let _watcher = cache.watch();

    registry.upsert_zone(zone("k", "Kitchen", Some("h")));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while cache.zone(&id("k")).is_none() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "watcher never picked up the new zone"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    registry.remove_zone(&id("k"));
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while cache.zone(&id("k")).is_some() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "watcher never dropped the deleted zone"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn event_bursts_coalesce_into_one_rebuild() {
    let registry = Arc::new(CountingRegistry::new([zone("h", "Home", None)]));
    let config = CacheConfig {
        debounce_ms: 100,
        ..test_config()
    };
    let cache = ZoneCache::initialize(Arc::clone(&registry), config)
        .await
        .unwrap();
    let _watcher = cache.watch();

    registry.inner.upsert_zone(zone("k", "Kitchen", Some("h")));
    registry.inner.upsert_zone(zone("b", "Bedroom", Some("h")));
    registry.inner.upsert_zone(zone("g", "Garage", None));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(
        names(&cache.all_zones()),
        ["Garage", "Home", "Bedroom", "Kitchen"]
    );
    // One fetch for initialize, one for the whole burst.
    assert_eq!(registry.fetches(), 2);
}

#[tokio::test(start_paused = true)]
async fn resubscribe_rebuilds_to_recover_missed_changes() {
    let registry = Arc::new(InMemoryRegistry::with_zones([zone("h", "Home", None)]));
    let config = CacheConfig {
        resubscribe_interval_secs: 60,
        ..test_config()
    };
    let cache = ZoneCache::initialize(Arc::clone(&registry), config)
        .await
        .unwrap();
    let _watcher = cache.watch();

    // The change is never delivered on the event stream.
    registry.replace_zones_silently([
        zone("h", "Home", None),
        zone("k", "Kitchen", Some("h")),
    ]);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(cache.zone(&id("k")).is_none());

    // The periodic re-subscription rebuilds and picks it up.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(cache.zone(&id("k")).is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_never_see_a_torn_snapshot() {
    // Two alternating zone-set generations with recognizably different
    // structure. Any mix of the two would produce a name list that matches
    // neither expectation.
    let generation_a = vec![
        zone("h", "Home", None),
        zone("k", "Kitchen", Some("h")),
        zone("b", "Bedroom", Some("h")),
    ];
    let generation_b = vec![
        zone("h", "Home", None),
        zone("f1", "First floor", Some("h")),
        zone("k", "Kitchen", Some("f1")),
    ];
    let expect_a = ["Home", "Bedroom", "Kitchen"];
    let expect_b = ["Home", "First floor", "Kitchen"];

    let registry = Arc::new(InMemoryRegistry::with_zones(generation_a.clone()));
    let cache = ZoneCache::initialize(Arc::clone(&registry), test_config())
        .await
        .unwrap();

    let mut readers = Vec::new();
    for _ in 0..4 {
        let cache = Arc::clone(&cache);
        readers.push(tokio::spawn(async move {
            for _ in 0..500 {
                let snapshot = cache.snapshot();
                let listed: Vec<String> = snapshot
                    .all_zones()
                    .iter()
                    .map(|z| z.name.clone())
                    .collect();
                assert!(
                    listed == expect_a || listed == expect_b,
                    "torn snapshot observed: {listed:?}"
                );
                // Derived indices must agree with the same generation.
                for zone in snapshot.all_zones() {
                    for child in snapshot.direct_children(&zone.id) {
                        assert_eq!(child.parent.as_ref(), Some(&zone.id));
                    }
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    for round in 0..50 {
        let generation = if round % 2 == 0 {
            generation_b.clone()
        } else {
            generation_a.clone()
        };
        registry.replace_zones(generation);
        cache.rebuild().await.unwrap();
    }

    for reader in readers {
        reader.await.unwrap();
    }
}

/// Wraps an [`InMemoryRegistry`] and counts whole-graph fetches.
struct CountingRegistry {
    inner: InMemoryRegistry,
    fetch_count: AtomicUsize,
}

impl CountingRegistry {
    fn new(zones: impl IntoIterator<Item = ZoneRecord>) -> Self {
        Self {
            inner: InMemoryRegistry::with_zones(zones),
            fetch_count: AtomicUsize::new(0),
        }
    }

    fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

impl ZoneRegistry for CountingRegistry {
    async fn fetch_all_zones(&self) -> Result<Vec<ZoneRecord>, RegistryError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_all_zones().await
    }

    async fn fetch_zone(&self, id: &ZoneId) -> Result<ZoneRecord, RegistryError> {
        self.inner.fetch_zone(id).await
    }

    async fn fetch_device_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
    ) -> Result<Option<CapabilityReading>, RegistryError> {
        self.inner.fetch_device_capability(device_id, capability_id).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ZoneEvent> {
        self.inner.subscribe()
    }
}

/// A registry whose fetches never complete, for timeout coverage.
struct StalledRegistry {
    events: broadcast::Sender<ZoneEvent>,
}

impl StalledRegistry {
    fn new() -> Self {
        let (events, _) = broadcast::channel(8);
        Self { events }
    }
}

impl ZoneRegistry for StalledRegistry {
    async fn fetch_all_zones(&self) -> Result<Vec<ZoneRecord>, RegistryError> {
        std::future::pending().await
    }

    async fn fetch_zone(&self, _id: &ZoneId) -> Result<ZoneRecord, RegistryError> {
        std::future::pending().await
    }

    async fn fetch_device_capability(
        &self,
        _device_id: &DeviceId,
        _capability_id: &CapabilityId,
    ) -> Result<Option<CapabilityReading>, RegistryError> {
        std::future::pending().await
    }

    fn subscribe(&self) -> broadcast::Receiver<ZoneEvent> {
        self.events.subscribe()
    }
}

#[tokio::test]
async fn stalled_fetch_surfaces_a_timeout() {
    let config = CacheConfig {
        fetch_timeout_ms: 50,
        ..test_config()
    };
    let result = ZoneCache::initialize(Arc::new(StalledRegistry::new()), config).await;
    assert!(matches!(result, Err(CacheError::Timeout { timeout_ms: 50 })));
}
