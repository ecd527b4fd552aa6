//! Continuous-activity window evaluation.
//!
//! Answers "has this zone been continuously active (or inactive) for at
//! least M minutes". The active case traces the zone's activity origins,
//! device capability readings and nested zones, to find the oldest
//! contributing activation timestamp. The walk fetches live registry data
//! rather than the cache snapshot: the timestamps are what the answer hangs
//! on, so they must be fresh.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::timeout;

use za_core::{ActivityState, CapabilityId, CapabilityReading, DeviceId, Origin, ZoneId, ZoneRecord};
use za_registry::ZoneRegistry;

use crate::config::CacheConfig;
use crate::error::CacheError;

/// Evaluates continuous-activity windows against the live registry.
#[derive(Debug)]
pub struct ActivityResolver<R> {
    registry: Arc<R>,
    fetch_timeout: Duration,
    fetch_timeout_ms: u64,
}

impl<R: ZoneRegistry> ActivityResolver<R> {
    #[must_use]
    pub fn new(registry: Arc<R>, config: &CacheConfig) -> Self {
        Self {
            registry,
            fetch_timeout: config.fetch_timeout(),
            fetch_timeout_ms: config.fetch_timeout_ms,
        }
    }

    /// Whether `zone_id` has been continuously in `state` for at least
    /// `minutes`.
    ///
    /// Fails with [`CacheError::ZoneNotFound`] when the zone id does not
    /// resolve: a condition over a missing zone cannot be evaluated, which
    /// is different from being false.
    pub async fn is_window_satisfied(
        &self,
        zone_id: &ZoneId,
        minutes: u32,
        state: ActivityState,
    ) -> Result<bool, CacheError> {
        let zone = self.fetch_zone(zone_id).await?;
        let now = Utc::now();
        let window = TimeDelta::minutes(i64::from(minutes));

        let satisfied = match state {
            ActivityState::Inactive => inactive_for(&zone, window, now),
            ActivityState::Active => self.active_for(&zone, window, now).await,
        };
        tracing::debug!(
            zone = %zone.name,
            minutes,
            state = %state,
            satisfied,
            "evaluated activity window"
        );
        Ok(satisfied)
    }

    /// The active case: the zone must currently be active and the oldest
    /// contributing activation timestamp must be at least `window` old.
    async fn active_for(&self, zone: &ZoneRecord, window: TimeDelta, now: DateTime<Utc>) -> bool {
        if !zone.active {
            return false;
        }
        let mut visited = HashSet::new();
        visited.insert(zone.id.clone());
        let mut timestamps = Vec::new();
        self.collect_timestamps(zone.clone(), &mut visited, &mut timestamps)
            .await;

        // With nothing collected, a continuous window cannot be demonstrated.
        timestamps
            .iter()
            .min()
            .is_some_and(|oldest| now - *oldest >= window)
    }

    /// Gathers candidate activation timestamps from a zone and its origin
    /// graph. The visited set stops origin cycles; a revisited zone simply
    /// does not contribute again.
    fn collect_timestamps<'a>(
        &'a self,
        zone: ZoneRecord,
        visited: &'a mut HashSet<ZoneId>,
        out: &'a mut Vec<DateTime<Utc>>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if let Some(ts) = zone.active_last_updated {
                out.push(ts);
            }
            for origin in &zone.active_origins {
                match origin {
                    Origin::DeviceCapability {
                        device_id,
                        capability_id,
                    } => match self.fetch_capability(device_id, capability_id).await {
                        Ok(Some(CapabilityReading {
                            last_updated: Some(ts),
                            ..
                        })) => out.push(ts),
                        Ok(_) => {}
                        Err(error) => {
                            tracing::debug!(device = %device_id, capability = %capability_id, %error, "skipping unreadable capability origin");
                        }
                    },
                    Origin::Zone { zone_id } => {
                        if !visited.insert(zone_id.clone()) {
                            tracing::debug!(zone = %zone_id, "skipping already-visited zone origin");
                            continue;
                        }
                        match self.fetch_zone(zone_id).await {
                            Ok(nested) => {
                                self.collect_timestamps(nested, visited, out).await;
                            }
                            Err(error) => {
                                tracing::debug!(zone = %zone_id, %error, "skipping unfetchable zone origin");
                            }
                        }
                    }
                }
            }
        })
    }

    async fn fetch_zone(&self, id: &ZoneId) -> Result<ZoneRecord, CacheError> {
        timeout(self.fetch_timeout, self.registry.fetch_zone(id))
            .await
            .map_err(|_| CacheError::Timeout {
                timeout_ms: self.fetch_timeout_ms,
            })?
            .map_err(CacheError::from)
    }

    async fn fetch_capability(
        &self,
        device_id: &DeviceId,
        capability_id: &CapabilityId,
    ) -> Result<Option<CapabilityReading>, CacheError> {
        timeout(
            self.fetch_timeout,
            self.registry.fetch_device_capability(device_id, capability_id),
        )
        .await
        .map_err(|_| CacheError::Timeout {
            timeout_ms: self.fetch_timeout_ms,
        })?
        .map_err(CacheError::from)
    }
}

/// The inactive case: never having been active counts as inactive for any
/// window; otherwise the zone must be inactive and must have flipped at
/// least `window` ago.
fn inactive_for(zone: &ZoneRecord, window: TimeDelta, now: DateTime<Utc>) -> bool {
    zone.active_last_updated
        .is_none_or(|flipped| !zone.active && now - flipped >= window)
}
