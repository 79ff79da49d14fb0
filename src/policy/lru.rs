//! # LRU (Least Recently Used) Cache
//!
//! Access-ordered companion to the LFU cache, built on [`lru::LruCache`].
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                  ConcurrentLruCache<K, V>                    │
//!   │                                                              │
//!   │   Arc<Mutex<LruState<K, V>>>                                 │
//!   │                                                              │
//!   │   head ──► [D] ◄──► [A] ◄──► [B] ◄── tail                    │
//!   │            MRU                LRU (next victim)              │
//!   └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! `get`, `put` on an existing key and `put_if_absent` on an existing key
//! all move the entry to the MRU end. `peek` and the `contains_*` checks do
//! not. Like the LFU cache, a capacity `<= 0` stores nothing.
//!
//! ## Example
//!
//! ```
//! use freqcache::policy::lru::ConcurrentLruCache;
//!
//! let cache = ConcurrentLruCache::new(3);
//! cache.put(1, "a");
//! cache.put(2, "b");
//! cache.put(3, "c");
//! cache.get(&1);
//! cache.put(4, "d");
//!
//! assert!(!cache.contains_key(&2));
//! assert_eq!(cache.keys(), vec![4, 1, 3]);
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use rustc_hash::FxBuildHasher;
use tracing::{debug, trace};

use crate::policy::lfu::clamp_capacity;
use crate::traits::ConcurrentCache;

struct LruState<K, V> {
    map: LruCache<K, Arc<V>, FxBuildHasher>,
    capacity: usize,
}

impl<K, V> LruState<K, V>
where
    K: Eq + Hash,
{
    fn put(&mut self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        if self.capacity == 0 {
            return None;
        }
        if self.map.contains(&key) {
            return self.map.put(key, value);
        }
        if self.map.len() >= self.capacity && self.map.pop_lru().is_some() {
            trace!(len = self.map.len(), "lru evicted entry");
        }
        self.map.put(key, value)
    }
}

/// Thread-safe LRU cache. Clones share one cache.
pub struct ConcurrentLruCache<K, V> {
    inner: Arc<Mutex<LruState<K, V>>>,
}

impl<K, V> Clone for ConcurrentLruCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> fmt::Debug for ConcurrentLruCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("ConcurrentLruCache")
            .field("len", &state.map.len())
            .field("capacity", &state.capacity)
            .finish_non_exhaustive()
    }
}

impl<K, V> Default for ConcurrentLruCache<K, V>
where
    K: Eq + Hash,
{
    /// Capacity 16.
    fn default() -> Self {
        Self::new(16)
    }
}

impl<K, V> ConcurrentLruCache<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty cache; `capacity <= 0` yields one that stores nothing.
    ///
    /// The bound is enforced here rather than by the underlying map, so a
    /// very large capacity does not preallocate.
    pub fn new(capacity: i64) -> Self {
        if capacity <= 0 {
            debug!(capacity, "lru cache created with non-positive capacity; it will store nothing");
        }
        Self {
            inner: Arc::new(Mutex::new(LruState {
                map: LruCache::unbounded_with_hasher(FxBuildHasher),
                capacity: clamp_capacity(capacity),
            })),
        }
    }

    /// Inserts or overwrites `key`, returning the previous value.
    ///
    /// ```
    /// use freqcache::policy::lru::ConcurrentLruCache;
    ///
    /// let cache = ConcurrentLruCache::new(2);
    /// assert!(cache.put("k", 1).is_none());
    /// assert_eq!(cache.put("k", 2).as_deref(), Some(&1));
    /// ```
    pub fn put(&self, key: K, value: V) -> Option<Arc<V>> {
        self.put_arc(key, Arc::new(value))
    }

    pub fn put_arc(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        self.inner.lock().put(key, value)
    }

    /// Stores `value` only when `key` is absent.
    ///
    /// Returns the existing value (and promotes it) when the key is present.
    pub fn put_if_absent(&self, key: K, value: V) -> Option<Arc<V>> {
        let mut state = self.inner.lock();
        if let Some(existing) = state.map.get(&key) {
            return Some(Arc::clone(existing));
        }
        state.put(key, Arc::new(value));
        None
    }

    /// Inserts every pair in iteration order under one lock acquisition.
    pub fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut state = self.inner.lock();
        for (key, value) in entries {
            state.put(key, Arc::new(value));
        }
    }

    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.inner.lock().map.get(key).cloned()
    }

    /// Reads without promoting.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.inner.lock().map.peek(key).cloned()
    }

    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.inner.lock().map.pop(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.lock().map.contains(key)
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.inner.lock().map.iter().any(|(_, v)| **v == *value)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    pub fn clear(&self) {
        let mut state = self.inner.lock();
        debug!(dropped = state.map.len(), "lru cache cleared");
        state.map.clear();
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.inner.lock().map.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Values from most to least recently used.
    pub fn values(&self) -> Vec<Arc<V>> {
        self.inner.lock().map.iter().map(|(_, v)| Arc::clone(v)).collect()
    }

    /// Entries from most to least recently used.
    pub fn entries(&self) -> Vec<(K, Arc<V>)>
    where
        K: Clone,
    {
        self.inner
            .lock()
            .map
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect()
    }

    /// Keeps only entries for which `keep` returns true. Survivors keep
    /// their relative order.
    pub fn retain<F>(&self, mut keep: F)
    where
        K: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        let mut state = self.inner.lock();
        let doomed: Vec<K> = state
            .map
            .iter()
            .filter(|(k, v)| !keep(k, v))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            state.map.pop(key);
        }
    }
}

impl<K, V> ConcurrentCache for ConcurrentLruCache<K, V>
where
    K: Send,
    V: Send + Sync,
{
}

#[cfg(test)]
mod tests {
    use super::*;

    mod correctness {
        use super::*;

        #[test]
        fn evicts_least_recently_used() {
            let cache = ConcurrentLruCache::new(2);
            cache.put("a", 1);
            cache.put("b", 2);
            cache.get(&"a");
            cache.put("c", 3);

            assert!(!cache.contains_key(&"b"));
            assert_eq!(cache.get(&"a").as_deref(), Some(&1));
            assert_eq!(cache.get(&"c").as_deref(), Some(&3));
        }

        #[test]
        fn overwrite_promotes_and_keeps_len() {
            let cache = ConcurrentLruCache::new(2);
            cache.put(1, "one");
            cache.put(2, "two");
            assert_eq!(cache.put(1, "uno").as_deref(), Some(&"one"));
            assert_eq!(cache.len(), 2);

            cache.put(3, "three");
            assert!(!cache.contains_key(&2));
            assert_eq!(cache.peek(&1).as_deref(), Some(&"uno"));
        }

        #[test]
        fn peek_does_not_promote() {
            let cache = ConcurrentLruCache::new(2);
            cache.put(1, ());
            cache.put(2, ());
            cache.peek(&1);
            cache.put(3, ());
            assert!(!cache.contains_key(&1));
        }

        #[test]
        fn put_if_absent_returns_existing() {
            let cache = ConcurrentLruCache::new(2);
            assert_eq!(cache.put_if_absent("k", 1), None);
            assert_eq!(cache.put_if_absent("k", 2).as_deref(), Some(&1));
            assert_eq!(cache.get(&"k").as_deref(), Some(&1));
        }

        #[test]
        fn views_are_mru_first() {
            let cache = ConcurrentLruCache::new(4);
            cache.put_all([(1, 'a'), (2, 'b'), (3, 'c')]);
            cache.get(&1);

            assert_eq!(cache.keys(), vec![1, 3, 2]);
            assert_eq!(
                cache.values().iter().map(|v| **v).collect::<Vec<_>>(),
                vec!['a', 'c', 'b']
            );
            assert_eq!(
                cache.entries().into_iter().map(|(k, v)| (k, *v)).collect::<Vec<_>>(),
                vec![(1, 'a'), (3, 'c'), (2, 'b')]
            );
            assert!(cache.contains_value(&'b'));
            assert!(!cache.contains_value(&'z'));
        }

        #[test]
        fn retain_and_remove() {
            let cache = ConcurrentLruCache::new(8);
            cache.put_all((0..6).map(|i| (i, i * 10)));
            cache.retain(|k, _| k % 2 == 0);

            assert_eq!(cache.keys(), vec![4, 2, 0]);
            assert_eq!(cache.remove(&2).as_deref(), Some(&20));
            assert_eq!(cache.remove(&2), None);
            cache.clear();
            assert!(cache.is_empty());
        }
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn non_positive_capacity_stores_nothing() {
            for capacity in [0, -5] {
                let cache = ConcurrentLruCache::new(capacity);
                assert_eq!(cache.put(1, 1), None);
                assert_eq!(cache.put_if_absent(2, 2), None);
                assert_eq!(cache.capacity(), 0);
                assert!(cache.is_empty());
                assert!(cache.get(&1).is_none());
            }
        }

        #[test]
        fn len_never_exceeds_capacity() {
            let cache = ConcurrentLruCache::new(3);
            for i in 0..50 {
                cache.put(i, i);
                assert!(cache.len() <= 3);
            }
            assert_eq!(cache.keys(), vec![49, 48, 47]);
        }

        #[test]
        fn clones_share_state() {
            let a: ConcurrentLruCache<u8, u8> = ConcurrentLruCache::default();
            let b = a.clone();
            a.put(1, 1);
            assert!(b.contains_key(&1));
            assert_eq!(b.capacity(), 16);
        }
    }
}
