//! Cache and resolver errors.

use thiserror::Error;

use za_core::ZoneId;
use za_registry::RegistryError;

/// Errors surfaced by the cache and the activity resolver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The zone a caller asked about does not resolve.
    ///
    /// Callers evaluating conditions should treat this as "cannot be
    /// evaluated", not as a false condition.
    #[error("zone not found: {0}")]
    ZoneNotFound(ZoneId),

    /// A registry fetch failed; transient, the previous snapshot stays
    /// current.
    #[error("registry fetch failed: {0}")]
    Registry(RegistryError),

    /// A registry fetch exceeded the configured timeout.
    #[error("registry fetch timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
}

impl From<RegistryError> for CacheError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::ZoneNotFound(id) => Self::ZoneNotFound(id),
            other => Self::Registry(other),
        }
    }
}
