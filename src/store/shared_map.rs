//! Thread-safe associative container with a compute/merge surface.
//!
//! ## Architecture
//! - Entries live in one `FxHashMap<K, V>` behind a `parking_lot::RwLock`.
//! - Reads (`get`, views, `reduce`) share the read lock; every mutation,
//!   including the `compute*`/`merge` family, runs under the write lock, so a
//!   remapping closure observes and replaces the current value atomically.
//! - Clones of a [`SharedMap`] share the same entries.
//!
//! ## Remapping
//! Closures passed to `compute`, `compute_if_absent`, `compute_if_present`
//! and `merge` return `Option<V>`. `None` means "no mapping": the key is
//! removed (or not inserted).
//!
//! ## Example Usage
//! ```rust
//! use freqcache::store::SharedMap;
//!
//! let hits: SharedMap<&str, u32> = SharedMap::new();
//! hits.put("home", 1).put("about", 1);
//! hits.merge("home", 1, |old, new| Some(old + new));
//! hits.compute_if_present("about", |_, _| None);
//!
//! assert_eq!(hits.get(&"home"), Some(2));
//! assert!(!hits.contains_key(&"about"));
//!
//! let frozen = hits.frozen();
//! hits.clear();
//! assert_eq!(frozen.get("home"), Some(&2));
//! ```
//!
//! ## Thread Safety
//! - `SharedMap` is `Send + Sync` when `K` and `V` are.
//! - Closures run while the lock is held; they must not call back into the
//!   same map.

use std::fmt;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Read-only snapshot produced by [`SharedMap::frozen`]. Cheap to clone.
#[derive(Clone)]
pub struct FrozenMap<K, V>(Arc<FxHashMap<K, V>>);

impl<K, V> Deref for FrozenMap<K, V> {
    type Target = FxHashMap<K, V>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for FrozenMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

pub struct SharedMap<K, V> {
    inner: Arc<RwLock<FxHashMap<K, V>>>,
}

impl<K, V> Clone for SharedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> fmt::Debug for SharedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMap")
            .field("len", &self.inner.read().len())
            .finish_non_exhaustive()
    }
}

impl<K, V> Default for SharedMap<K, V> {
    fn default() -> Self {
        Self::from_map(FxHashMap::default())
    }
}

impl<K, V> FromIterator<(K, V)> for SharedMap<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

/// Applies a remapping result: `Some` stores, `None` removes.
fn apply<K, V>(map: &mut FxHashMap<K, V>, key: K, next: Option<V>) -> Option<V>
where
    K: Eq + Hash,
    V: Clone,
{
    match next {
        Some(value) => {
            map.insert(key, value.clone());
            Some(value)
        },
        None => {
            map.remove(&key);
            None
        },
    }
}

impl<K, V> SharedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: FxHashMap<K, V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Visits every entry under the read lock, in unspecified order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (k, v) in self.inner.read().iter() {
            f(k, v);
        }
    }

    /// Folds every entry into an accumulator, in unspecified order.
    pub fn reduce<A, F>(&self, init: A, mut f: F) -> A
    where
        F: FnMut(A, &K, &V) -> A,
    {
        self.inner
            .read()
            .iter()
            .fold(init, |acc, (k, v)| f(acc, k, v))
    }
}

impl<K, V> SharedMap<K, V>
where
    K: Eq + Hash,
{
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_map(FxHashMap::with_capacity_and_hasher(capacity, Default::default()))
    }

    /// Inserts or overwrites; returns `self` so calls can be chained.
    pub fn put(&self, key: K, value: V) -> &Self {
        self.inner.write().insert(key, value);
        self
    }

    pub fn put_all<I>(&self, entries: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.inner.write().extend(entries);
        self
    }

    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.read().get(key).cloned()
    }

    pub fn get_or(&self, key: &K, default: V) -> V
    where
        V: Clone,
    {
        self.get(key).unwrap_or(default)
    }

    /// Overwrites `key` only if it is already mapped; returns the old value.
    pub fn replace(&self, key: &K, value: V) -> Option<V> {
        let mut map = self.inner.write();
        map.get_mut(key).map(|slot| std::mem::replace(slot, value))
    }

    /// Overwrites `key` only if it currently maps to `expected`.
    pub fn replace_if_eq(&self, key: &K, expected: &V, value: V) -> bool
    where
        V: PartialEq,
    {
        let mut map = self.inner.write();
        match map.get_mut(key) {
            Some(slot) if *slot == *expected => {
                *slot = value;
                true
            },
            _ => false,
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.write().remove(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.inner.read().values().any(|v| v == value)
    }

    /// Replaces the mapping for `key` with `remap(key, current)`.
    ///
    /// Returns the new value, or `None` if the key ended up unmapped.
    pub fn compute<F>(&self, key: K, remap: F) -> Option<V>
    where
        V: Clone,
        F: FnOnce(&K, Option<&V>) -> Option<V>,
    {
        let mut map = self.inner.write();
        let next = remap(&key, map.get(&key));
        apply(&mut *map, key, next)
    }

    /// Returns the current value, or stores and returns `init(key)` when the
    /// key is absent.
    pub fn compute_if_absent<F>(&self, key: K, init: F) -> Option<V>
    where
        V: Clone,
        F: FnOnce(&K) -> Option<V>,
    {
        let mut map = self.inner.write();
        if let Some(existing) = map.get(&key) {
            return Some(existing.clone());
        }
        let next = init(&key);
        match next {
            Some(value) => {
                map.insert(key, value.clone());
                Some(value)
            },
            None => None,
        }
    }

    /// Remaps an existing value; absent keys are left alone.
    pub fn compute_if_present<F>(&self, key: K, remap: F) -> Option<V>
    where
        V: Clone,
        F: FnOnce(&K, &V) -> Option<V>,
    {
        let mut map = self.inner.write();
        let next = remap(&key, map.get(&key)?);
        apply(&mut *map, key, next)
    }

    /// Stores `value` if `key` is absent, otherwise `remap(current, value)`.
    pub fn merge<F>(&self, key: K, value: V, remap: F) -> Option<V>
    where
        V: Clone,
        F: FnOnce(&V, V) -> Option<V>,
    {
        let mut map = self.inner.write();
        let next = match map.get(&key) {
            Some(current) => remap(current, value),
            None => Some(value),
        };
        apply(&mut *map, key, next)
    }

    /// Rewrites every value in place.
    pub fn replace_all<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V) -> V,
    {
        for (k, v) in self.inner.write().iter_mut() {
            let next = f(k, v);
            *v = next;
        }
    }

    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.inner.read().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.inner.read().values().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.inner
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Owned copy of the entries matching `keep`.
    pub fn filter<F>(&self, mut keep: F) -> FxHashMap<K, V>
    where
        K: Clone,
        V: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        self.inner
            .read()
            .iter()
            .filter(|(k, v)| keep(k, v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// New map with rekeyed entries. Colliding keys keep one arbitrary value.
    pub fn map_keys<K2, F>(&self, mut f: F) -> SharedMap<K2, V>
    where
        K2: Eq + Hash,
        V: Clone,
        F: FnMut(&K) -> K2,
    {
        self.inner
            .read()
            .iter()
            .map(|(k, v)| (f(k), v.clone()))
            .collect()
    }

    pub fn map_values<V2, F>(&self, mut f: F) -> SharedMap<K, V2>
    where
        K: Clone,
        F: FnMut(&V) -> V2,
    {
        self.inner
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), f(v)))
            .collect()
    }

    pub fn snapshot(&self) -> FxHashMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.inner.read().clone()
    }

    /// Immutable copy detached from further writes.
    pub fn frozen(&self) -> FrozenMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        FrozenMap(Arc::new(self.snapshot()))
    }
}
