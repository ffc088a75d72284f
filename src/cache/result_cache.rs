//! Result Cache
//!
//! TTL cache of opaque JSON values keyed by [`Fingerprint`]. Shared by the
//! generation orchestrator and by auxiliary memoization. Thread-safe with
//! lazy expiry on lookup and least-recently-used eviction at capacity.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use super::Fingerprint;
use crate::config::CacheConfig;
use crate::types::Result;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
    pub size: usize,
}

impl CacheStats {
    /// Cache hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

struct CacheEntry {
    value: serde_json::Value,
    inserted_at: Instant,
    last_accessed: Instant,
}

pub struct ResultCache {
    entries: RwLock<HashMap<Fingerprint, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl ResultCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.max_entries)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry. Expired entries are removed and count as a miss.
    pub fn get(&self, key: &Fingerprint) -> Option<serde_json::Value> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let expired = match entries.get_mut(key) {
            Some(entry) if now.duration_since(entry.inserted_at) < self.ttl => {
                entry.last_accessed = now;
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key = key.short(), "Cache entry expired");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or replace, evicting the least recently used entry at capacity
    pub fn put(&self, key: Fingerprint, value: serde_json::Value) {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            self.evict_oldest(&mut entries);
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                last_accessed: now,
            },
        );
    }

    /// Typed lookup. A value that no longer decodes is reported as an error
    /// so the caller can record the fallback.
    pub fn get_as<T: DeserializeOwned>(&self, key: &Fingerprint) -> Result<Option<T>> {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn put_as<T: Serialize>(&self, key: Fingerprint, value: &T) -> Result<()> {
        self.put(key, serde_json::to_value(value)?);
        Ok(())
    }

    /// Drop one entry without touching statistics
    pub fn invalidate(&self, key: &Fingerprint) -> bool {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key)
            .is_some()
    }

    /// Eagerly evict every entry; returns how many were removed
    pub fn clear(&self) -> usize {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let removed = entries.len();
        entries.clear();
        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Eagerly evict expired entries; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.inserted_at) < self.ttl);
        let removed = before - entries.len();
        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            eviction_count: self.evictions.load(Ordering::Relaxed),
            size: self.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict oldest entry (LRU)
    fn evict_oldest(&self, entries: &mut HashMap<Fingerprint, CacheEntry>) {
        if let Some(oldest_key) = entries
            .iter()
            .min_by_key(|(_, v)| v.last_accessed)
            .map(|(k, _)| k.clone())
        {
            entries.remove(&oldest_key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(name: &str) -> Fingerprint {
        Fingerprint::for_parts("test", &[name])
    }

    #[tokio::test]
    async fn test_round_trip() {
        let cache = ResultCache::default();
        cache.put(key("a"), json!({"files": 2}));
        assert_eq!(cache.get(&key("a")), Some(json!({"files": 2})));
        assert_eq!(cache.get(&key("b")), None);

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_counts_miss_and_eviction() {
        let cache = ResultCache::new(Duration::from_secs(24 * 3600), 10);
        cache.put(key("a"), json!("v"));

        tokio::time::advance(Duration::from_secs(23 * 3600)).await;
        assert_eq!(cache.get(&key("a")), Some(json!("v")));

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(cache.get(&key("a")), None);

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.eviction_count, 1);
        assert_eq!(stats.size, 0);
    }

    #[tokio::test]
    async fn test_clear_counts_evictions() {
        let cache = ResultCache::default();
        cache.put(key("a"), json!(1));
        cache.put(key("b"), json!(2));
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().eviction_count, 2);
        assert_eq!(cache.get(&key("a")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lru_eviction() {
        let cache = ResultCache::new(Duration::from_secs(60), 2);
        cache.put(key("a"), json!(1));
        tokio::time::advance(Duration::from_millis(10)).await;
        cache.put(key("b"), json!(2));
        tokio::time::advance(Duration::from_millis(10)).await;
        // Touch "a" so "b" becomes least recently used
        assert!(cache.get(&key("a")).is_some());
        tokio::time::advance(Duration::from_millis(10)).await;
        cache.put(key("c"), json!(3));

        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("b")).is_none());
        assert!(cache.get(&key("c")).is_some());
        assert_eq!(cache.stats().eviction_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = ResultCache::new(Duration::from_secs(60), 10);
        cache.put(key("old"), json!(1));
        tokio::time::advance(Duration::from_secs(61)).await;
        cache.put(key("new"), json!(2));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_typed_access() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Output {
            files: Vec<String>,
        }

        let cache = ResultCache::default();
        let value = Output {
            files: vec!["app/api/route.ts".to_string()],
        };
        cache.put_as(key("typed"), &value).unwrap();
        assert_eq!(cache.get_as::<Output>(&key("typed")).unwrap(), Some(value));

        cache.put(key("bad"), json!("not an object"));
        assert!(cache.get_as::<Output>(&key("bad")).is_err());
    }
}
