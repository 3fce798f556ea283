//! Cache Store Module
//!
//! Bounded key-value store with per-entry TTL, stalest-first eviction and
//! namespace invalidation.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::stats::format_bytes;
use crate::cache::{CacheEntry, CacheStats, NAMESPACE_SEPARATOR};
use crate::clock::{system_clock, SharedClock};

// == TTL Cache ==
/// Main cache storage with TTL expiry and eviction by insertion age.
///
/// Reads never extend an entry's lifetime. When a new key arrives while the
/// cache is full, the entry with the oldest insertion time is dropped.
#[derive(Debug)]
pub struct TtlCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Hit, miss and eviction counters
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL applied when `set` gets none
    default_ttl_ms: u64,
    clock: SharedClock,
}

impl<V> TtlCache<V> {
    // == Constructor ==
    /// Creates a new cache with the given capacity and default TTL.
    ///
    /// A capacity of `0` is bumped to `1`.
    pub fn new(max_size: usize, default_ttl_ms: u64) -> Self {
        Self::with_clock(max_size, default_ttl_ms, system_clock())
    }

    /// Creates a new cache reading time from `clock`.
    pub fn with_clock(max_size: usize, default_ttl_ms: u64, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_size: max_size.max(1),
            default_ttl_ms,
            clock,
        }
    }

    // == Set ==
    /// Stores a value, replacing any previous entry under the same key.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl_ms` - Optional TTL in milliseconds (uses the default if None)
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_ms: Option<u64>) {
        let key = key.into();
        let now = self.clock.now_ms();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_stalest(now);
        }

        let ttl = ttl_ms.unwrap_or(self.default_ttl_ms);
        self.entries.insert(key, CacheEntry::new(value, now, ttl));
    }

    // == Has ==
    /// Returns true if `key` holds a live entry.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Milliseconds `key` has left to live, or None if it is missing or expired.
    pub fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining_ms(now))
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether something was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Invalidate Namespace ==
    /// Removes every key starting with `namespace:`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_namespace(&mut self, namespace: &str) -> usize {
        let prefix = format!("{}{}", namespace, NAMESPACE_SEPARATOR);
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(&prefix));
        let removed = before - self.entries.len();

        info!(namespace, removed, "Invalidated cache namespace");
        removed
    }

    // == Clean Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn clean_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    // == Valid Entries ==
    /// Iterates over live entries whose key sits under `namespace`.
    pub fn valid_entries_in<'a>(
        &'a self,
        namespace: &str,
    ) -> impl Iterator<Item = (&'a str, &'a V)> + 'a {
        let prefix = format!("{}{}", namespace, NAMESPACE_SEPARATOR);
        let now = self.clock.now_ms();
        self.entries
            .iter()
            .filter(move |(key, entry)| key.starts_with(&prefix) && !entry.is_expired(now))
            .map(|(key, entry)| (key.as_str(), &entry.value))
    }

    /// Returns the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl_ms(&self) -> u64 {
        self.default_ttl_ms
    }

    fn evict_stalest(&mut self, now: u64) {
        let stalest = self
            .entries
            .iter()
            .max_by(|(ka, a), (kb, b)| a.age_ms(now).cmp(&b.age_ms(now)).then(kb.cmp(ka)))
            .map(|(key, _)| key.clone());

        if let Some(key) = stalest {
            self.entries.remove(&key);
            self.stats.record_eviction();
            debug!(key = %key, "Evicted stalest cache entry");
        }
    }
}

impl<V: Clone> TtlCache<V> {
    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();

        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }
}

impl<V: Serialize> TtlCache<V> {
    // == Stats ==
    /// Returns current cache statistics.
    ///
    /// `memory_usage` counts key bytes plus the JSON size of each value.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let expired = self
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .count();
        let bytes: usize = self
            .entries
            .iter()
            .map(|(key, entry)| {
                key.len() + serde_json::to_vec(&entry.value).map(|v| v.len()).unwrap_or(0)
            })
            .sum();

        CacheStats {
            total_entries: self.entries.len(),
            valid_entries: self.entries.len() - expired,
            expired_entries: expired,
            max_size: self.max_size,
            memory_usage: format_bytes(bytes),
            ..self.stats.clone()
        }
    }
}
