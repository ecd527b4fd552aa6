//! Zone records and activity origins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CapabilityId, DeviceId, ZoneId};

/// One zone as mirrored from the external registry.
///
/// Records are owned by the snapshot that contains them; a rebuild produces
/// fresh records rather than mutating published ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneRecord {
    /// Unique identifier assigned by the registry.
    pub id: ZoneId,

    /// Display name.
    pub name: String,

    /// Parent zone, if any. `None` means this zone is a root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ZoneId>,

    /// Opaque icon identifier.
    #[serde(default)]
    pub icon: String,

    /// Current aggregate activity state.
    #[serde(default)]
    pub active: bool,

    /// When `active` last flipped. `None` means the zone has never been active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_last_updated: Option<DateTime<Utc>>,

    /// What caused this zone to become active.
    #[serde(default)]
    pub active_origins: Vec<Origin>,
}

/// A reference to whatever caused a zone's `active` flag to become true.
///
/// The registry encodes these as tagged strings (`zone:<id>` or
/// `capability:<deviceId>:<capabilityId>`). They are decoded once at the wire
/// boundary; unrecognized kinds are dropped there, so this enum only carries
/// the kinds the activity walk understands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// A device capability reading (e.g., a motion sensor's alarm).
    DeviceCapability {
        device_id: DeviceId,
        capability_id: CapabilityId,
    },
    /// Another zone whose activity propagated upward.
    Zone { zone_id: ZoneId },
}

impl Origin {
    /// Decodes a registry-encoded origin string.
    ///
    /// Returns `None` for unrecognized kinds or malformed ids; callers are
    /// expected to skip those (the registry may emit origin kinds this
    /// version does not know about).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(zone_id) = raw.strip_prefix("zone:") {
            let zone_id = ZoneId::new(zone_id).ok()?;
            return Some(Self::Zone { zone_id });
        }
        if let Some(rest) = raw.strip_prefix("capability:") {
            let (device_id, capability_id) = rest.split_once(':')?;
            let device_id = DeviceId::new(device_id).ok()?;
            let capability_id = CapabilityId::new(capability_id).ok()?;
            return Some(Self::DeviceCapability {
                device_id,
                capability_id,
            });
        }
        None
    }
}

/// A live capability reading fetched from the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityReading {
    /// The current value; shape depends on the capability.
    pub value: serde_json::Value,

    /// When the value last changed, if the registry tracks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zone_origin() {
        let origin = Origin::parse("zone:abc-123").unwrap();
        assert_eq!(
            origin,
            Origin::Zone {
                zone_id: ZoneId::new("abc-123").unwrap()
            }
        );
    }

    #[test]
    fn parses_capability_origin() {
        let origin = Origin::parse("capability:dev1:alarm_motion").unwrap();
        assert_eq!(
            origin,
            Origin::DeviceCapability {
                device_id: DeviceId::new("dev1").unwrap(),
                capability_id: CapabilityId::new("alarm_motion").unwrap(),
            }
        );
    }

    #[test]
    fn capability_id_may_contain_colons() {
        // Only the first separator splits device from capability.
        let origin = Origin::parse("capability:dev1:sub:part").unwrap();
        assert_eq!(
            origin,
            Origin::DeviceCapability {
                device_id: DeviceId::new("dev1").unwrap(),
                capability_id: CapabilityId::new("sub:part").unwrap(),
            }
        );
    }

    #[test]
    fn rejects_unknown_kinds() {
        assert_eq!(Origin::parse("wallpaper:xyz"), None);
        assert_eq!(Origin::parse("zone:"), None);
        assert_eq!(Origin::parse("capability:only-device"), None);
        assert_eq!(Origin::parse(""), None);
    }
}
