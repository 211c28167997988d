//! Bounded LRU caches owned by one client
//!
//! Keys are derived from content or content addresses, so a cached value is
//! never stale and entries leave only by capacity eviction.

use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Default capacity of the chunk content cache
pub const CHUNK_CACHE_CAPACITY: usize = 1024;

/// Default capacity of the blob upload-dedup cache
pub const UPLOAD_CACHE_CAPACITY: usize = 100;

/// Default capacity of the blob download cache
pub const DOWNLOAD_CACHE_CAPACITY: usize = 100;

/// Fixed-capacity LRU cache, or an always-miss stand-in when none could be built
pub enum Cache<K: Hash + Eq, V: Clone> {
    Lru(Mutex<LruCache<K, V>>),
    Disabled,
}

impl<K: Hash + Eq, V: Clone> Cache<K, V> {
    /// Build a cache of `capacity` entries.
    ///
    /// Never fails: a capacity that cannot back an LRU gives [`Cache::Disabled`],
    /// and every lookup then goes to the network.
    pub fn new(name: &str, capacity: usize) -> Self {
        match NonZeroUsize::new(capacity) {
            Some(cap) => Cache::Lru(Mutex::new(LruCache::new(cap))),
            None => {
                log::warn!("{} cache disabled (capacity {})", name, capacity);
                Cache::Disabled
            }
        }
    }

    /// Look up and mark as recently used
    pub fn get(&self, key: &K) -> Option<V> {
        match self {
            Cache::Lru(cache) => cache.lock().get(key).cloned(),
            Cache::Disabled => None,
        }
    }

    pub fn put(&self, key: K, value: V) {
        if let Cache::Lru(cache) = self {
            cache.lock().put(key, value);
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Cache::Lru(cache) => cache.lock().len(),
            Cache::Disabled => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Cache::Lru(_))
    }
}
