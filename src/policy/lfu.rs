//! # LFU (Least Frequently Used) Cache
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                     ConcurrentLfuCache<K, V>                         │
//!   │                                                                      │
//!   │   Arc<Mutex<LfuCore<K, V>>>   one exclusive lock, no read fast path  │
//!   │                                                                      │
//!   │   ┌──────────────────────────────────────────────────────────────┐   │
//!   │   │  LfuCore<K, V>                                               │   │
//!   │   │                                                              │   │
//!   │   │  store: FxHashMap<K, Arc<V>>          entry store            │   │
//!   │   │  freq:  FrequencyBuckets<K>                                  │   │
//!   │   │           ├─ per-entry freq           frequency table        │   │
//!   │   │           ├─ freq -> ordered keys     frequency index        │   │
//!   │   │           └─ min_freq                 min-frequency cursor   │   │
//!   │   │  capacity: usize                                             │   │
//!   │   └──────────────────────────────────────────────────────────────┘   │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Access Semantics
//!
//! Both `get` and an overwriting `put` count as a use: the key moves from
//! the bucket for its count `n` to the bucket for `n + 1`. That is the only
//! way a frequency grows. `get` is therefore a write and takes the same lock
//! as `put`.
//!
//! ## Eviction
//!
//! ```text
//!   put(new_key) on a full cache
//!        │
//!        ▼
//!   bucket[min_freq] ──► pop tail (oldest arrival at that count)
//!        │                drop key from store, table and index
//!        ▼
//!   insert new_key at freq 1, min_freq = 1
//! ```
//!
//! Example with capacity 2:
//!
//! ```text
//!   put(A) put(B)       {A:1, B:1}   bucket1 = [A, B]  (oldest first)
//!   get(A)              {A:2, B:1}   bucket1 = [B]  bucket2 = [A]
//!   put(C)              evict B      {A:2, C:1}
//! ```
//!
//! ## Degenerate Capacity
//!
//! A capacity of zero (or a negative capacity passed to
//! [`ConcurrentLfuCache::new`]) yields a cache that stores nothing: every
//! `put` is a no-op and every `get` misses.
//!
//! ## Example
//!
//! ```
//! use freqcache::policy::lfu::ConcurrentLfuCache;
//!
//! let cache = ConcurrentLfuCache::new(2);
//! cache.put("a", 1);
//! cache.put("b", 2);
//! assert_eq!(cache.get(&"a").as_deref(), Some(&1));
//!
//! cache.put("c", 3);
//! assert!(cache.get(&"b").is_none());
//! assert_eq!(cache.get(&"c").as_deref(), Some(&3));
//! ```
//!
//! ## Thread Safety
//!
//! - `LfuCore`: single-owner; wrap it yourself or use the concurrent type.
//! - `ConcurrentLfuCache`: `Send + Sync` when `K: Send` and `V: Send + Sync`;
//!   clones share one cache. Operations are linearizable per instance.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::ds::FrequencyBuckets;
use crate::error::{InvariantError, ensure};
use crate::traits::{ConcurrentCache, CoreCache, LfuCacheTrait, MutableCache};

/// Maps a signed capacity onto `usize`, treating anything non-positive as 0.
pub(crate) fn clamp_capacity(capacity: i64) -> usize {
    if capacity <= 0 {
        0
    } else {
        usize::try_from(capacity).unwrap_or(usize::MAX)
    }
}

/// Single-owner LFU cache: entry store plus frequency buckets.
pub struct LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    store: FxHashMap<K, Arc<V>>,
    freq: FrequencyBuckets<K>,
    capacity: usize,
}

impl<K, V> LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// Storage is reserved up front, capped so a huge nominal capacity does
    /// not allocate eagerly.
    pub fn new(capacity: usize) -> Self {
        let reserve = capacity.min(4096);
        LfuCore {
            store: FxHashMap::with_capacity_and_hasher(reserve, Default::default()),
            freq: FrequencyBuckets::with_capacity(reserve),
            capacity,
        }
    }

    /// Reads `key` without counting an access.
    pub fn peek(&self, key: &K) -> Option<&Arc<V>> {
        self.store.get(key)
    }

    /// Lowest populated frequency, `None` when empty.
    pub fn min_frequency(&self) -> Option<u64> {
        self.freq.min_freq()
    }

    /// Keys currently at `freq`, oldest arrival (next to evict) first.
    pub fn keys_at_frequency(&self, freq: u64) -> impl Iterator<Item = &K> {
        self.freq.bucket_keys(freq)
    }

    /// Verifies that store, frequency table, bucket index and cursor agree
    /// and that the capacity bound holds.
    pub fn check_invariants(&self) -> Result<(), InvariantError>
    where
        K: fmt::Debug,
    {
        ensure(self.store.len() <= self.capacity, || {
            format!("{} entries exceed capacity {}", self.store.len(), self.capacity)
        })?;
        ensure(self.store.len() == self.freq.len(), || {
            format!(
                "{} stored entries but {} tracked frequencies",
                self.store.len(),
                self.freq.len()
            )
        })?;
        if let Some(missing) = self.store.keys().find(|k| !self.freq.contains(k)) {
            return Err(InvariantError::new(format!(
                "{missing:?} is stored but has no frequency bucket"
            )));
        }
        self.freq.check_invariants()
    }

    fn evict(&mut self) -> Option<(K, Arc<V>)> {
        let (key, freq) = self.freq.pop_min()?;
        let value = self.store.remove(&key)?;
        trace!(freq, len = self.store.len(), "lfu evicted entry");
        Some((key, value))
    }
}

impl<K, V> fmt::Debug for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCore")
            .field("len", &self.store.len())
            .field("capacity", &self.capacity)
            .field("min_freq", &self.freq.min_freq())
            .finish_non_exhaustive()
    }
}

impl<K, V> CoreCache<K, Arc<V>> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn insert(&mut self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        if self.capacity == 0 {
            return None;
        }

        if let Some(slot) = self.store.get_mut(&key) {
            let previous = std::mem::replace(slot, value);
            self.freq.touch(&key);
            return Some(previous);
        }

        if self.store.len() >= self.capacity {
            self.evict();
        }
        self.freq.insert(key.clone());
        self.store.insert(key, value);
        None
    }

    fn get(&mut self, key: &K) -> Option<&Arc<V>> {
        if !self.store.contains_key(key) {
            return None;
        }
        self.freq.touch(key);
        self.store.get(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.store.contains_key(key)
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.store.clear();
        self.freq.clear();
    }
}

impl<K, V> MutableCache<K, Arc<V>> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn remove(&mut self, key: &K) -> Option<Arc<V>> {
        let value = self.store.remove(key)?;
        self.freq.remove(key);
        Some(value)
    }
}

impl<K, V> LfuCacheTrait<K, Arc<V>> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn pop_lfu(&mut self) -> Option<(K, Arc<V>)> {
        let (key, _) = self.freq.pop_min()?;
        let value = self.store.remove(&key)?;
        Some((key, value))
    }

    fn peek_lfu(&self) -> Option<(&K, &Arc<V>)> {
        let (key, _) = self.freq.peek_min()?;
        self.store.get_key_value(key)
    }

    fn frequency(&self, key: &K) -> Option<u64> {
        self.freq.frequency(key)
    }

    fn reset_frequency(&mut self, key: &K) -> Option<u64> {
        self.freq.reset(key)
    }

    fn increment_frequency(&mut self, key: &K) -> Option<u64> {
        self.freq.touch(key)
    }
}

/// Thread-safe LFU cache: one [`LfuCore`] behind one exclusive lock.
///
/// Every operation, including reads, holds the lock for its full duration,
/// so the store, frequency table, bucket index and min cursor are never
/// observed mid-update. Cloning yields another handle to the same cache.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use freqcache::policy::lfu::ConcurrentLfuCache;
///
/// let cache: ConcurrentLfuCache<u64, String> = ConcurrentLfuCache::new(64);
///
/// let handles: Vec<_> = (0..4u64)
///     .map(|t| {
///         let cache = cache.clone();
///         thread::spawn(move || {
///             for i in 0..32 {
///                 cache.put(t * 100 + i, format!("v{i}"));
///                 cache.get(&(t * 100));
///             }
///         })
///     })
///     .collect();
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert!(cache.len() <= 64);
/// assert!(cache.check_invariants().is_ok());
/// ```
pub struct ConcurrentLfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    inner: Arc<Mutex<LfuCore<K, V>>>,
}

impl<K, V> Clone for ConcurrentLfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> fmt::Debug for ConcurrentLfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.lock();
        f.debug_struct("ConcurrentLfuCache")
            .field("len", &core.len())
            .field("capacity", &core.capacity())
            .finish_non_exhaustive()
    }
}

impl<K, V> Default for ConcurrentLfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Capacity 16.
    fn default() -> Self {
        Self::new(16)
    }
}

impl<K, V> ConcurrentLfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache.
    ///
    /// `capacity <= 0` produces a cache that never stores anything.
    ///
    /// ```
    /// use freqcache::policy::lfu::ConcurrentLfuCache;
    ///
    /// let cache = ConcurrentLfuCache::new(-3);
    /// cache.put(1, "one");
    /// assert_eq!(cache.capacity(), 0);
    /// assert!(cache.get(&1).is_none());
    /// ```
    pub fn new(capacity: i64) -> Self {
        if capacity <= 0 {
            debug!(capacity, "lfu cache created with non-positive capacity; it will store nothing");
        }
        Self::from_core(LfuCore::new(clamp_capacity(capacity)))
    }

    /// Wraps an existing core, keeping its contents and frequencies.
    pub fn from_core(core: LfuCore<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(core)),
        }
    }

    /// Returns the value for `key` and counts one access.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut core = self.inner.lock();
        core.get(key).cloned()
    }

    /// Stores `value` under `key`.
    ///
    /// Overwriting an existing key counts as an access. A new key in a full
    /// cache evicts the least frequently used entry first.
    pub fn put(&self, key: K, value: V) {
        self.insert(key, value);
    }

    /// Like [`put`](Self::put) but hands back the overwritten value.
    pub fn insert(&self, key: K, value: V) -> Option<Arc<V>> {
        self.insert_arc(key, Arc::new(value))
    }

    /// Stores an already shared value without re-wrapping it.
    pub fn insert_arc(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        let mut core = self.inner.lock();
        core.insert(key, value)
    }

    /// Reads `key` without counting an access.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        let core = self.inner.lock();
        core.peek(key).cloned()
    }

    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        let mut core = self.inner.lock();
        core.remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn clear(&self) {
        let mut core = self.inner.lock();
        debug!(dropped = core.len(), "lfu cache cleared");
        core.clear();
    }

    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.inner.lock().frequency(key)
    }

    pub fn min_frequency(&self) -> Option<u64> {
        self.inner.lock().min_frequency()
    }

    /// The entry the next eviction would remove.
    pub fn peek_lfu(&self) -> Option<(K, Arc<V>)> {
        let core = self.inner.lock();
        core.peek_lfu().map(|(k, v)| (k.clone(), Arc::clone(v)))
    }

    pub fn pop_lfu(&self) -> Option<(K, Arc<V>)> {
        self.inner.lock().pop_lfu()
    }

    pub fn increment_frequency(&self, key: &K) -> Option<u64> {
        self.inner.lock().increment_frequency(key)
    }

    pub fn reset_frequency(&self, key: &K) -> Option<u64> {
        self.inner.lock().reset_frequency(key)
    }

    /// Runs [`LfuCore::check_invariants`] under the lock.
    pub fn check_invariants(&self) -> Result<(), InvariantError>
    where
        K: fmt::Debug,
    {
        self.inner.lock().check_invariants()
    }
}

impl<K, V> ConcurrentCache for ConcurrentLfuCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Send + Sync,
{
}


#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Put(u8, u32),
        Get(u8),
        Remove(u8),
        PopLfu,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0u8..16, any::<u32>()).prop_map(|(k, v)| Op::Put(k, v)),
            4 => (0u8..16).prop_map(Op::Get),
            1 => (0u8..16).prop_map(Op::Remove),
            1 => Just(Op::PopLfu),
        ]
    }

    proptest! {
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_invariants_and_capacity_hold(
            capacity in 0usize..8,
            ops in prop::collection::vec(op(), 0..200)
        ) {
            let mut cache: LfuCore<u8, u32> = LfuCore::new(capacity);
            let mut last_written = std::collections::HashMap::new();

            for op in ops {
                match op {
                    Op::Put(k, v) => {
                        cache.insert(k, Arc::new(v));
                        if capacity > 0 {
                            last_written.insert(k, v);
                        }
                    }
                    Op::Get(k) => {
                        if let Some(v) = cache.get(&k) {
                            prop_assert_eq!(Some(&**v), last_written.get(&k));
                        }
                    }
                    Op::Remove(k) => {
                        cache.remove(&k);
                    }
                    Op::PopLfu => {
                        let expected_freq = cache.min_frequency();
                        let victim = cache.peek_lfu().map(|(k, _)| *k);
                        let popped = cache.pop_lfu().map(|(k, _)| k);
                        prop_assert_eq!(popped, victim);
                        if let Some(k) = popped {
                            prop_assert!(expected_freq.is_some());
                            prop_assert!(!cache.contains(&k));
                        }
                    }
                }

                prop_assert!(cache.len() <= capacity);
                prop_assert!(cache.check_invariants().is_ok());
            }
        }

        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_victim_has_minimum_frequency(
            capacity in 1usize..6,
            keys in prop::collection::vec(0u8..12, 1..120)
        ) {
            let mut cache: LfuCore<u8, ()> = LfuCore::new(capacity);
            for k in keys {
                if cache.get(&k).is_none() {
                    cache.insert(k, Arc::new(()));
                }
                if let Some((victim, _)) = cache.peek_lfu() {
                    let victim_freq = cache.frequency(victim).unwrap();
                    let min = cache
                        .store
                        .keys()
                        .filter_map(|k| cache.frequency(k))
                        .min()
                        .unwrap();
                    prop_assert_eq!(victim_freq, min);
                }
            }
        }
    }
}
