//! Cache configuration.
//!
//! Resolved from the `[cache]` table of `spendwise.toml` (see `config::CacheSettings`).

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_STALE_AFTER_SECS: u64 = 60;
const DEFAULT_MAX_ENTRIES: usize = 256;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When disabled every read goes to the network and nothing is stored.
    pub enabled: bool,
    /// Age after which an entry is served only as a placeholder and refetched on read.
    pub stale_after: Duration,
    /// Maximum number of cached query results (LRU eviction).
    pub max_entries: NonZeroUsize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_after: Duration::from_secs(DEFAULT_STALE_AFTER_SECS),
            max_entries: NonZeroUsize::new(DEFAULT_MAX_ENTRIES).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            stale_after: settings.stale_after,
            max_entries: settings.max_entries,
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}
