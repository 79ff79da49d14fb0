//! Unified cache builder for the available eviction policies.
//!
//! Both policies produce a thread-safe cache; [`Cache`] hides which one is
//! behind it so callers can switch policy by configuration.
//!
//! ## Example
//!
//! ```rust
//! use freqcache::builder::{CacheBuilder, CachePolicy};
//!
//! let cache = CacheBuilder::new(100).build::<u64, String>(CachePolicy::Lfu);
//! cache.put(1, "hello".to_string());
//! assert_eq!(cache.get(&1).as_deref().map(String::as_str), Some("hello"));
//! ```

use std::hash::Hash;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::policy::lfu::ConcurrentLfuCache;
use crate::policy::lru::ConcurrentLruCache;

/// Available cache eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Least Frequently Used, ties broken by arrival at the frequency.
    #[default]
    Lfu,
    /// Least Recently Used.
    Lru,
}

/// Plain-data cache configuration.
///
/// `capacity` is signed: non-positive values are accepted by
/// [`CacheBuilder::build`] and produce a cache that stores nothing, while
/// [`CacheConfig::validate`] and [`CacheBuilder::try_build`] reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub capacity: i64,
    pub policy: CachePolicy,
}

impl CacheConfig {
    pub fn lfu(capacity: i64) -> Self {
        Self {
            capacity,
            policy: CachePolicy::Lfu,
        }
    }

    pub fn lru(capacity: i64) -> Self {
        Self {
            capacity,
            policy: CachePolicy::Lru,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity <= 0 {
            return Err(ConfigError::new(
                "capacity",
                format!("must be positive, got {}", self.capacity),
            ));
        }
        if usize::try_from(self.capacity).is_err() {
            return Err(ConfigError::new(
                "capacity",
                format!("{} does not fit in usize on this platform", self.capacity),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::lfu(16)
    }
}

/// Policy-dispatching cache handle. Clones share one cache.
pub enum Cache<K, V>
where
    K: Eq + Hash + Clone,
{
    Lfu(ConcurrentLfuCache<K, V>),
    Lru(ConcurrentLruCache<K, V>),
}

impl<K, V> Clone for Cache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn clone(&self) -> Self {
        match self {
            Cache::Lfu(lfu) => Cache::Lfu(lfu.clone()),
            Cache::Lru(lru) => Cache::Lru(lru.clone()),
        }
    }
}

impl<K, V> std::fmt::Debug for Cache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cache::Lfu(lfu) => f.debug_tuple("Cache::Lfu").field(lfu).finish(),
            Cache::Lru(lru) => f.debug_tuple("Cache::Lru").field(lru).finish(),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn policy(&self) -> CachePolicy {
        match self {
            Cache::Lfu(_) => CachePolicy::Lfu,
            Cache::Lru(_) => CachePolicy::Lru,
        }
    }

    /// Insert a key-value pair. Returns the previous value if the key existed.
    pub fn insert(&self, key: K, value: V) -> Option<Arc<V>> {
        match self {
            Cache::Lfu(lfu) => lfu.insert(key, value),
            Cache::Lru(lru) => lru.put(key, value),
        }
    }

    pub fn put(&self, key: K, value: V) {
        self.insert(key, value);
    }

    /// Looks up `key`, counting it as an access for the policy.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        match self {
            Cache::Lfu(lfu) => lfu.get(key),
            Cache::Lru(lru) => lru.get(key),
        }
    }

    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        match self {
            Cache::Lfu(lfu) => lfu.peek(key),
            Cache::Lru(lru) => lru.peek(key),
        }
    }

    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        match self {
            Cache::Lfu(lfu) => lfu.remove(key),
            Cache::Lru(lru) => lru.remove(key),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        match self {
            Cache::Lfu(lfu) => lfu.contains(key),
            Cache::Lru(lru) => lru.contains_key(key),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Cache::Lfu(lfu) => lfu.len(),
            Cache::Lru(lru) => lru.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match self {
            Cache::Lfu(lfu) => lfu.capacity(),
            Cache::Lru(lru) => lru.capacity(),
        }
    }

    pub fn clear(&self) {
        match self {
            Cache::Lfu(lfu) => lfu.clear(),
            Cache::Lru(lru) => lru.clear(),
        }
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone, Copy)]
pub struct CacheBuilder {
    capacity: i64,
}

impl CacheBuilder {
    pub fn new(capacity: i64) -> Self {
        Self { capacity }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Build a cache with the specified policy.
    ///
    /// ```rust
    /// use freqcache::builder::{CacheBuilder, CachePolicy};
    ///
    /// let lru = CacheBuilder::new(100).build::<u64, String>(CachePolicy::Lru);
    /// let empty = CacheBuilder::new(0).build::<u64, String>(CachePolicy::Lfu);
    /// empty.put(1, "dropped".into());
    /// assert!(empty.is_empty());
    /// assert_eq!(lru.capacity(), 100);
    /// ```
    pub fn build<K, V>(self, policy: CachePolicy) -> Cache<K, V>
    where
        K: Eq + Hash + Clone,
    {
        match policy {
            CachePolicy::Lfu => Cache::Lfu(ConcurrentLfuCache::new(self.capacity)),
            CachePolicy::Lru => Cache::Lru(ConcurrentLruCache::new(self.capacity)),
        }
    }

    /// Like [`build`](Self::build) but rejects a non-positive capacity.
    pub fn try_build<K, V>(self, policy: CachePolicy) -> Result<Cache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
    {
        CacheConfig {
            capacity: self.capacity,
            policy,
        }
        .validate()?;
        Ok(self.build(policy))
    }
}

impl From<CacheConfig> for CacheBuilder {
    fn from(config: CacheConfig) -> Self {
        Self::from_config(&config)
    }
}
