//! The zone hierarchy cache.
//!
//! Mirrors the external zone graph as an immutable [`Snapshot`] behind a
//! single atomic pointer swap. A rebuild constructs the whole new snapshot
//! off to the side and publishes it in one step, so concurrent readers see
//! either the old generation or the new one, never a torn mix. Readers
//! never block on a rebuild in progress.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use za_core::{Snapshot, ZoneId, ZoneRecord};
use za_registry::{ZoneEvent, ZoneRegistry};

use crate::config::CacheConfig;
use crate::error::CacheError;

/// A queryable, structurally-consistent mirror of the external zone graph.
///
/// Constructed with [`ZoneCache::initialize`], which runs the first rebuild;
/// afterwards [`ZoneCache::watch`] keeps the snapshot converging toward the
/// registry's state as change events arrive. All read operations are
/// serviced from one fully-built snapshot and are safe to call concurrently
/// with rebuilds.
#[derive(Debug)]
pub struct ZoneCache<R> {
    registry: Arc<R>,
    config: CacheConfig,
    current: RwLock<Arc<Snapshot>>,
}

impl<R: ZoneRegistry> ZoneCache<R> {
    /// Builds the cache, performing the initial rebuild.
    ///
    /// Fails if the first fetch fails; there is no earlier snapshot to fall
    /// back on.
    pub async fn initialize(registry: Arc<R>, config: CacheConfig) -> Result<Arc<Self>, CacheError> {
        let snapshot = fetch_snapshot(registry.as_ref(), &config).await?;
        tracing::debug!(zones = snapshot.len(), "initial snapshot built");
        Ok(Arc::new(Self {
            registry,
            config,
            current: RwLock::new(Arc::new(snapshot)),
        }))
    }

    /// Refetches the zone graph and publishes a new snapshot.
    ///
    /// On failure the previous snapshot remains current and the error is
    /// returned; stale-but-consistent beats partially built.
    pub async fn rebuild(&self) -> Result<(), CacheError> {
        let snapshot = fetch_snapshot(self.registry.as_ref(), &self.config).await?;
        tracing::debug!(zones = snapshot.len(), "publishing new snapshot");
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
        Ok(())
    }

    /// The current snapshot.
    ///
    /// The returned handle stays internally consistent for as long as the
    /// caller holds it, regardless of rebuilds happening meanwhile.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Looks up a single zone.
    #[must_use]
    pub fn zone(&self, id: &ZoneId) -> Option<ZoneRecord> {
        self.snapshot().zone(id).cloned()
    }

    /// Looks up several zones, silently dropping unknown ids.
    #[must_use]
    pub fn zones(&self, ids: &[ZoneId]) -> Vec<ZoneRecord> {
        cloned(self.snapshot().zones(ids))
    }

    /// The full tree, depth-first, name-sorted at every level.
    #[must_use]
    pub fn all_zones(&self) -> Vec<ZoneRecord> {
        cloned(self.snapshot().all_zones())
    }

    /// All ancestors of a zone, nearest first.
    #[must_use]
    pub fn all_parents(&self, id: &ZoneId) -> Vec<ZoneRecord> {
        cloned(self.snapshot().all_parents(id))
    }

    /// All descendants of a zone, pre-order, each level name-sorted.
    #[must_use]
    pub fn all_children(&self, id: &ZoneId) -> Vec<ZoneRecord> {
        cloned(self.snapshot().all_children(id))
    }

    /// Immediate children of a zone, name-sorted.
    #[must_use]
    pub fn direct_children(&self, id: &ZoneId) -> Vec<ZoneRecord> {
        cloned(self.snapshot().direct_children(id))
    }

    /// Wall-clock time of the most recent completed rebuild.
    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.snapshot().taken_at()
    }

    /// Spawns the background watcher that rebuilds on registry change
    /// events.
    ///
    /// Bursts of events within the configured debounce window coalesce into
    /// one rebuild. The subscription is re-established periodically as a
    /// liveness workaround. The task stops when the returned handle drops.
    #[must_use]
    pub fn watch(self: &Arc<Self>) -> WatcherHandle {
        // Subscribe before spawning so events emitted right after this call
        // returns are already observed.
        let events = self.registry.subscribe();
        let cache = Arc::clone(self);
        let handle = tokio::spawn(async move { cache.run_watcher(events).await });
        WatcherHandle { handle }
    }

    async fn run_watcher(&self, mut events: broadcast::Receiver<ZoneEvent>) {
        let period = self.config.resubscribe_interval();
        let mut resubscribe = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(event) => {
                        tracing::debug!(kind = ?event.kind, zone = %event.zone_id, "zone change event");
                        self.debounce(&mut events).await;
                        self.rebuild_or_keep().await;
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "event stream lagged, rebuilding");
                        self.rebuild_or_keep().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("event stream closed, watcher stopping");
                        break;
                    }
                },
                _ = resubscribe.tick() => {
                    events = self.registry.subscribe();
                    tracing::debug!("re-established registry subscription");
                    // Events queued on the dropped receiver, or never
                    // delivered while the old subscription was dead, are
                    // recovered by rebuilding unconditionally.
                    self.rebuild_or_keep().await;
                }
            }
        }
    }

    /// Waits out the debounce window, then drains whatever queued up so the
    /// burst becomes a single rebuild.
    async fn debounce(&self, events: &mut broadcast::Receiver<ZoneEvent>) {
        let window = self.config.debounce();
        if window.is_zero() {
            return;
        }
        tokio::time::sleep(window).await;
        loop {
            match events.try_recv() {
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(
                    broadcast::error::TryRecvError::Empty
                    | broadcast::error::TryRecvError::Closed,
                ) => break,
            }
        }
    }

    async fn rebuild_or_keep(&self) {
        if let Err(error) = self.rebuild().await {
            tracing::warn!(%error, "rebuild failed, keeping previous snapshot");
        }
    }
}

/// Owns the background watcher task; aborts it on drop.
#[derive(Debug)]
pub struct WatcherHandle {
    handle: JoinHandle<()>,
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn fetch_snapshot<R: ZoneRegistry>(
    registry: &R,
    config: &CacheConfig,
) -> Result<Snapshot, CacheError> {
    let zones = timeout(config.fetch_timeout(), registry.fetch_all_zones())
        .await
        .map_err(|_| CacheError::Timeout {
            timeout_ms: config.fetch_timeout_ms,
        })??;
    Ok(Snapshot::build(zones, Utc::now()))
}

fn cloned(zones: Vec<&ZoneRecord>) -> Vec<ZoneRecord> {
    zones.into_iter().cloned().collect()
}
