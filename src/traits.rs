//! # Cache Trait Hierarchy
//!
//! ```text
//!   ┌───────────────────────────────┐
//!   │        CoreCache<K, V>        │   insert, get, contains, len,
//!   │                               │   is_empty, capacity, clear
//!   └───────────────┬───────────────┘
//!                   │
//!   ┌───────────────▼───────────────┐
//!   │      MutableCache<K, V>       │   remove, remove_batch
//!   └───────────────┬───────────────┘
//!                   │
//!   ┌───────────────▼───────────────┐
//!   │      LfuCacheTrait<K, V>      │   pop_lfu, peek_lfu, frequency,
//!   │                               │   reset_frequency, increment_frequency
//!   └───────────────────────────────┘
//!
//!   ConcurrentCache: marker (Send + Sync) for types that lock internally
//! ```
//!
//! The traits take `&mut self` and describe single-owner cores such as
//! [`LfuCore`](crate::policy::lfu::LfuCore). The thread-safe wrappers expose
//! the same operations as inherent `&self` methods and carry the
//! [`ConcurrentCache`] marker instead.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use freqcache::policy::lfu::LfuCore;
//! use freqcache::traits::{CoreCache, LfuCacheTrait, MutableCache};
//!
//! fn warm<C: CoreCache<u64, Arc<String>>>(cache: &mut C, rows: &[(u64, &str)]) {
//!     for (k, v) in rows {
//!         cache.insert(*k, Arc::new(v.to_string()));
//!     }
//! }
//!
//! let mut cache = LfuCore::new(2);
//! warm(&mut cache, &[(1, "one"), (2, "two")]);
//! cache.get(&1);
//!
//! assert_eq!(cache.peek_lfu().map(|(k, _)| *k), Some(2));
//! assert_eq!(cache.remove(&2).as_deref().map(String::as_str), Some("two"));
//! ```

/// Operations every cache supports regardless of eviction policy.
pub trait CoreCache<K, V> {
    /// Inserts or overwrites `key`, returning the previous value.
    ///
    /// Inserting a new key into a full cache first evicts one entry chosen
    /// by the policy. A zero-capacity cache ignores the call.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Looks up `key`. Counts as an access for the eviction policy.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Checks presence without counting as an access.
    fn contains(&self, key: &K) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    fn clear(&mut self);
}

/// Caches that allow arbitrary removal by key.
pub trait MutableCache<K, V>: CoreCache<K, V> {
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Removes each key in order; results line up with `keys`.
    fn remove_batch(&mut self, keys: &[K]) -> Vec<Option<V>> {
        keys.iter().map(|k| self.remove(k)).collect()
    }
}

/// Frequency-ordered eviction.
///
/// Ties at the lowest frequency go to the key that has held that
/// frequency the longest.
pub trait LfuCacheTrait<K, V>: MutableCache<K, V> {
    /// Removes and returns the current eviction candidate.
    fn pop_lfu(&mut self) -> Option<(K, V)>;

    /// Returns the current eviction candidate without touching it.
    fn peek_lfu(&self) -> Option<(&K, &V)>;

    fn frequency(&self, key: &K) -> Option<u64>;

    /// Drops `key` back to frequency 1, returning the frequency it had.
    fn reset_frequency(&mut self, key: &K) -> Option<u64>;

    /// Counts one access without reading the value; returns the new frequency.
    fn increment_frequency(&mut self, key: &K) -> Option<u64>;
}

/// Marker for caches that synchronize internally and can be shared across
/// threads behind `&self`.
///
/// ```
/// use freqcache::policy::lfu::ConcurrentLfuCache;
/// use freqcache::traits::ConcurrentCache;
///
/// fn share<C: ConcurrentCache + Clone + 'static>(cache: &C) -> std::thread::JoinHandle<()> {
///     let cache = cache.clone();
///     std::thread::spawn(move || drop(cache))
/// }
///
/// let cache: ConcurrentLfuCache<u32, String> = ConcurrentLfuCache::new(8);
/// share(&cache).join().unwrap();
/// ```
pub trait ConcurrentCache: Send + Sync {}
