//! Serde shapes for the registry's JSON zone representation.
//!
//! The registry encodes activity origins as tagged strings; they are decoded
//! into [`Origin`] variants here, at the boundary, so nothing deeper in the
//! system ever pattern-matches the raw encoding. Unrecognized origin kinds
//! are skipped with a debug log; the registry may emit kinds this version
//! does not know about, and those simply do not contribute.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use za_core::{Origin, ZoneId, ZoneRecord};

/// A zone as serialized by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireZone {
    pub id: ZoneId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ZoneId>,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub active_origins: Vec<String>,
}

impl From<WireZone> for ZoneRecord {
    fn from(wire: WireZone) -> Self {
        let active_origins = wire
            .active_origins
            .iter()
            .filter_map(|raw| {
                let origin = Origin::parse(raw);
                if origin.is_none() {
                    tracing::debug!(zone = %wire.id, origin = raw, "skipping unrecognized origin");
                }
                origin
            })
            .collect();

        Self {
            id: wire.id,
            name: wire.name,
            parent: wire.parent,
            icon: wire.icon,
            active: wire.active,
            active_last_updated: wire.active_last_updated,
            active_origins,
        }
    }
}

/// Parses a JSON array of registry zones into domain records.
pub fn zones_from_json(data: &str) -> Result<Vec<ZoneRecord>, serde_json::Error> {
    let wire: Vec<WireZone> = serde_json::from_str(data)?;
    Ok(wire.into_iter().map(ZoneRecord::from).collect())
}
