//! Bounded in-memory cache with per-entry expiry
//!
//! Provides a `CacheManager` that keeps at most `capacity` entries, each with an
//! expiry timestamp. Expired entries are swept lazily when they are looked up or
//! when room is needed for a new key; beyond that the least recently used entry
//! is evicted.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;

/// A single cached value with the time it was stored
#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    cached_at: Instant,
}

impl<V> CacheEntry<V> {
    // Measured from `cached_at` so an unbounded ttl cannot overflow an `Instant`
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() >= ttl
    }
}

/// Thread-safe cache bounded by size and entry lifetime
///
/// Two callers racing on the same missing key may both compute a value; the
/// last `insert` wins. The lock is never held while a value is computed.
#[derive(Debug)]
pub struct CacheManager<K: Hash + Eq, V> {
    entries: Mutex<LruCache<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> CacheManager<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of distinct keys held at once (at least 1)
    /// * `ttl` - How long an entry is served after it was inserted
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    // A poisoned lock only means another thread panicked mid-update; the map
    // itself is always left consistent, so keep using it.
    fn lock(&self) -> MutexGuard<'_, LruCache<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns a fresh cached value and marks it as most recently used
    ///
    /// An expired entry is dropped and reported as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.lock();

        if entries.peek(key)?.is_expired(self.ttl) {
            entries.pop(key);
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Stores a value, replacing any previous entry for the key
    ///
    /// When a new key arrives at capacity, expired entries are swept first; if
    /// the cache is still full the least recently used entry is evicted.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.lock();

        if !entries.contains(&key) && entries.len() >= entries.cap().get() {
            let expired: Vec<K> = entries
                .iter()
                .filter(|(_, entry)| entry.is_expired(self.ttl))
                .map(|(key, _)| key.clone())
                .collect();
            for key in expired {
                entries.pop(&key);
            }
        }

        entries.put(
            key,
            CacheEntry {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Number of entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry
    pub fn clear(&self) {
        self.lock().clear();
    }
}
