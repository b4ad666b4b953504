//! Cache storage.
//!
//! An LRU map of query results plus one epoch counter per resource family.
//! Invalidating a family bumps its epoch; a fetch remembers the epoch it
//! started under and may only populate the cache if that epoch is still
//! current, so a write is never shadowed by a read that raced it.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lru::LruCache;
use serde_json::Value;
use tokio::time::Instant;

use crate::util::lock::{rw_read, rw_write};

use super::config::CacheConfig;
use super::keys::{CacheKey, Resource};

const SOURCE: &str = "cache::store";

/// Monotonic per-family invalidation counter.
pub type Epoch = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Fresh,
    Stale,
}

/// A cached value as handed out to readers.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    pub value: Value,
    pub status: EntryStatus,
    pub age: Duration,
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    fetched_at: Instant,
}

pub struct CacheStore {
    entries: RwLock<LruCache<CacheKey, Entry>>,
    epochs: [AtomicU64; Resource::COUNT],
    stale_after: Duration,
}

impl CacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_entries)),
            epochs: Default::default(),
            stale_after: config.stale_after,
        }
    }

    /// Look up `key`, marking it recently used.
    pub fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        entries.get(key).map(|entry| self.view(entry))
    }

    /// Look up `key` without touching recency.
    pub fn peek(&self, key: &CacheKey) -> Option<CachedValue> {
        let entries = rw_read(&self.entries, SOURCE, "peek");
        entries.peek(key).map(|entry| self.view(entry))
    }

    pub fn get_fresh(&self, key: &CacheKey) -> Option<Value> {
        self.get(key)
            .filter(|cached| cached.status == EntryStatus::Fresh)
            .map(|cached| cached.value)
    }

    pub fn epoch(&self, resource: Resource) -> Epoch {
        self.epochs[resource.index()].load(Ordering::Acquire)
    }

    /// Store `value` unless `resource`'s family was invalidated after `epoch`
    /// was read. Returns whether the value was stored.
    pub fn insert_if_current(&self, key: CacheKey, value: Value, epoch: Epoch) -> bool {
        let mut entries = rw_write(&self.entries, SOURCE, "insert");
        if self.epoch(key.resource) != epoch {
            return false;
        }
        entries.put(
            key,
            Entry {
                value,
                fetched_at: Instant::now(),
            },
        );
        true
    }

    /// Remove every entry of `resource`, whatever its parameters. Returns the
    /// number of entries removed.
    pub fn invalidate(&self, resource: Resource) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate");
        self.epochs[resource.index()].fetch_add(1, Ordering::AcqRel);
        let doomed: Vec<CacheKey> = entries
            .iter()
            .filter(|(key, _)| key.resource == resource)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }

    pub fn clear(&self) {
        let mut entries = rw_write(&self.entries, SOURCE, "clear");
        for epoch in &self.epochs {
            epoch.fetch_add(1, Ordering::AcqRel);
        }
        entries.clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn view(&self, entry: &Entry) -> CachedValue {
        let age = entry.fetched_at.elapsed();
        let status = if age >= self.stale_after {
            EntryStatus::Stale
        } else {
            EntryStatus::Fresh
        };
        CachedValue {
            value: entry.value.clone(),
            status,
            age,
        }
    }
}
