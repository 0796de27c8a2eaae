//! TTL response cache with LRU eviction.

use crate::CacheConfig;
use crate::pattern::glob_to_regex;
use amazon_error::AmazonResult;
use derive_getters::Getters;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Cached value with its expiry.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Whether the entry has expired.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Time left before expiry, `None` once expired.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.expires_at.checked_duration_since(Instant::now())
    }
}

/// Cache counters since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing usable
    pub misses: u64,
    /// Entries dropped to make room
    pub evictions: u64,
    /// Entries dropped because their TTL passed
    pub expirations: u64,
    /// Entries currently held
    pub size: usize,
    /// Capacity
    pub max_size: usize,
}

#[derive(Debug)]
struct Slot<V> {
    entry: CacheEntry<V>,
    tick: u64,
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, Slot<V>>,
    // Recency tick -> key; the first entry is least recently used
    access_order: BTreeMap<u64, String>,
    next_tick: u64,
    stats: CacheStats,
}

impl<V> CacheState<V> {
    fn tick(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn insert(&mut self, key: &str, entry: CacheEntry<V>) {
        let tick = self.tick();
        if let Some(old) = self.entries.insert(key.to_string(), Slot { entry, tick }) {
            self.access_order.remove(&old.tick);
        }
        self.access_order.insert(tick, key.to_string());
    }

    fn forget(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let slot = self.entries.remove(key)?;
        self.access_order.remove(&slot.tick);
        Some(slot.entry)
    }

    fn touch(&mut self, key: &str) {
        let tick = self.tick();
        if let Some(slot) = self.entries.get_mut(key) {
            let previous = std::mem::replace(&mut slot.tick, tick);
            if let Some(key) = self.access_order.remove(&previous) {
                self.access_order.insert(tick, key);
            }
        }
    }

    fn evict_lru(&mut self) {
        if let Some((_, key)) = self.access_order.pop_first() {
            debug!(key = %key, "Evicting LRU entry");
            self.entries.remove(&key);
            self.stats.evictions += 1;
        }
    }
}

/// In-process cache for successful read responses.
///
/// Entries expire read-through: an expired entry is removed by the `get` that
/// finds it. Once `max_size` entries are held, inserting a new key evicts the
/// least recently used one; both `get` hits and `set` refresh recency.
///
/// All methods take `&self`; state sits behind a mutex so one cache can be
/// shared by concurrent requests.
///
/// # Example
///
/// ```
/// use amazon_cache::{CacheConfig, ResponseCache};
/// use serde_json::json;
/// use std::time::Duration;
///
/// let cache = ResponseCache::new(CacheConfig::default());
/// cache.set("associates:/paapi5/getitems:abc", json!({"ItemsResult": {}}), Some(Duration::from_secs(60)));
/// assert!(cache.get("associates:/paapi5/getitems:abc").is_some());
/// ```
#[derive(Debug)]
pub struct ResponseCache<V> {
    config: CacheConfig,
    state: Mutex<CacheState<V>>,
}

impl<V: Clone> ResponseCache<V> {
    /// Create an empty cache.
    pub fn new(config: CacheConfig) -> Self {
        debug!(
            max_size = config.max_size(),
            default_ttl_secs = config.default_ttl().as_secs(),
            enabled = config.enabled(),
            "Creating response cache"
        );
        let stats = CacheStats {
            max_size: *config.max_size(),
            ..Default::default()
        };
        Self {
            config,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                access_order: BTreeMap::new(),
                next_tick: 0,
                stats,
            }),
        }
    }

    /// Cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value for `key`, or `None` if absent, expired, or caching is disabled.
    #[instrument(skip(self), level = "trace")]
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.config.enabled() {
            return None;
        }
        let mut state = self.state();
        let expired = match state.entries.get(key) {
            None => {
                state.stats.misses += 1;
                return None;
            }
            Some(slot) => slot.entry.is_expired(),
        };
        if expired {
            debug!("Cache entry expired, removing");
            state.forget(key);
            state.stats.expirations += 1;
            state.stats.misses += 1;
            return None;
        }
        state.touch(key);
        state.stats.hits += 1;
        state.entries.get(key).map(|slot| slot.entry.value.clone())
    }

    /// Store `value` under `key` for `ttl` (default TTL if `None`).
    #[instrument(skip(self, value), level = "trace")]
    pub fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        if !self.config.enabled() || *self.config.max_size() == 0 {
            return;
        }
        let ttl = ttl.unwrap_or(*self.config.default_ttl());
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };

        let mut state = self.state();
        if !state.entries.contains_key(key) {
            while state.entries.len() >= *self.config.max_size() && !state.access_order.is_empty()
            {
                state.evict_lru();
            }
        }
        state.insert(key, entry);
        state.stats.size = state.entries.len();
    }

    /// Remove `key`, returning its value if it was live.
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut state = self.state();
        let entry = state.forget(key);
        state.stats.size = state.entries.len();
        entry.filter(|e| !e.is_expired()).map(|e| e.value)
    }

    /// Remove every entry whose key matches `glob` (`*` and `?` wildcards).
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern cannot be compiled.
    #[instrument(skip(self))]
    pub fn clear_pattern(&self, glob: &str) -> AmazonResult<usize> {
        let regex = glob_to_regex(glob)?;
        let mut state = self.state();
        let matching: Vec<String> = state
            .entries
            .keys()
            .filter(|key| regex.is_match(key))
            .cloned()
            .collect();
        for key in &matching {
            state.forget(key);
        }
        state.stats.size = state.entries.len();
        info!(removed = matching.len(), "Cleared cache entries by pattern");
        Ok(matching.len())
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut state = self.state();
        let count = state.entries.len();
        state.entries.clear();
        state.access_order.clear();
        state.stats.size = 0;
        info!(cleared = count, "Cleared cache");
    }

    /// Drop expired entries. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut state = self.state();
        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, slot)| slot.entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            state.forget(key);
        }
        state.stats.expirations += expired.len() as u64;
        state.stats.size = state.entries.len();
        if !expired.is_empty() {
            info!(
                removed = expired.len(),
                remaining = state.entries.len(),
                "Cleaned up expired cache entries"
            );
        }
        expired.len()
    }

    /// Number of entries held, including expired ones not yet collected.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }

    /// Counters snapshot.
    pub fn stats(&self) -> CacheStats {
        self.state().stats
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
