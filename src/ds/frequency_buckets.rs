//! Frequency buckets: the frequency table, bucket index and min-frequency
//! cursor of an LFU cache, kept consistent as one unit.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, SlotId>          entries: SlotArena<Entry<K>>
//!   ┌────────┬────────┐                  ┌──────┬──────────────────────────┐
//!   │ "a"    │ id_0   │ ───────────────► │ id_0 │ freq 2, prev/next links  │
//!   │ "b"    │ id_1   │ ───────────────► │ id_1 │ freq 1, prev/next links  │
//!   │ "c"    │ id_2   │ ───────────────► │ id_2 │ freq 1, prev/next links  │
//!   └────────┴────────┘                  └──────┴──────────────────────────┘
//!
//!   buckets: FxHashMap<u64, Bucket>       min_freq = 1
//!
//!     freq=1: head ─► [id_2] ◄─► [id_1] ◄─ tail     (tail = oldest arrival)
//!        │ next
//!        ▼
//!     freq=2: head ─► [id_0] ◄─ tail
//! ```
//!
//! Each entry carries its own frequency (the frequency table) and its links
//! inside exactly one bucket list (the frequency index). Buckets are chained
//! to their populated neighbours in ascending frequency order so that the
//! `min_freq` cursor can advance in O(1) when the lowest bucket empties.
//!
//! ## Ordering
//!
//! A key enters the head of a bucket when it arrives at that frequency
//! (insert, touch or reset). The tail is therefore the key that has sat at
//! that frequency the longest; [`pop_min`](FrequencyBuckets::pop_min) takes
//! the tail of the `min_freq` bucket.
//!
//! ## Empty buckets
//!
//! A bucket is unlinked and dropped the moment its last key leaves, and the
//! cursor is moved to the next populated bucket in the same step. `min_freq`
//! is `0` exactly when no keys are tracked.
//!
//! ## Operations
//!
//! | Operation   | Time | Notes                                   |
//! |-------------|------|-----------------------------------------|
//! | `insert`    | O(1) | New key at freq 1, cursor reset to 1    |
//! | `touch`     | O(1) | freq + 1, saturates at `u64::MAX`       |
//! | `reset`     | O(1) | Moves key back to freq 1                |
//! | `remove`    | O(1) |                                         |
//! | `pop_min`   | O(1) | Oldest arrival of the lowest bucket     |
//! | `peek_min`  | O(1) |                                         |
//!
//! ## Example
//!
//! ```
//! use freqcache::ds::FrequencyBuckets;
//!
//! let mut freq = FrequencyBuckets::new();
//! freq.insert("a");
//! freq.insert("b");
//! freq.insert("c");
//! freq.touch(&"a");
//!
//! assert_eq!(freq.min_freq(), Some(1));
//! assert_eq!(freq.pop_min(), Some(("b", 1)));
//! assert_eq!(freq.pop_min(), Some(("c", 1)));
//! assert_eq!(freq.pop_min(), Some(("a", 2)));
//! assert_eq!(freq.pop_min(), None);
//! ```
//!
//! ## Thread Safety
//!
//! Not synchronized. [`ConcurrentLfuCache`](crate::policy::lfu::ConcurrentLfuCache)
//! owns one behind its single lock.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::{InvariantError, ensure};

#[derive(Debug)]
struct Entry<K> {
    prev: Option<SlotId>,
    next: Option<SlotId>,
    freq: u64,
    key: K,
}

#[derive(Debug, Default)]
struct Bucket {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    prev: Option<u64>,
    next: Option<u64>,
}

/// Where an entry sat before it was detached from its bucket.
#[derive(Debug, Clone, Copy)]
struct Detached {
    freq: u64,
    prev_bucket: Option<u64>,
    next_bucket: Option<u64>,
    bucket_dropped: bool,
}

/// O(1) LFU bookkeeping with oldest-arrival tie-breaking.
#[derive(Debug)]
pub struct FrequencyBuckets<K> {
    entries: SlotArena<Entry<K>>,
    index: FxHashMap<K, SlotId>,
    buckets: FxHashMap<u64, Bucket>,
    min_freq: u64,
}

impl<K> FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Reserves room for `capacity` keys up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SlotArena::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FxHashMap::default(),
            min_freq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn frequency(&self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.entries.get(id).map(|entry| entry.freq)
    }

    /// Lowest populated frequency, `None` when empty.
    pub fn min_freq(&self) -> Option<u64> {
        (self.min_freq != 0).then_some(self.min_freq)
    }

    /// Number of populated buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// The next eviction candidate and its frequency.
    pub fn peek_min(&self) -> Option<(&K, u64)> {
        if self.min_freq == 0 {
            return None;
        }
        let id = self.buckets.get(&self.min_freq)?.tail?;
        let entry = self.entries.get(id)?;
        Some((&entry.key, entry.freq))
    }

    /// Keys at `freq`, oldest arrival first (eviction order).
    ///
    /// ```
    /// use freqcache::ds::FrequencyBuckets;
    ///
    /// let mut freq = FrequencyBuckets::new();
    /// freq.insert(1);
    /// freq.insert(2);
    /// freq.insert(3);
    /// freq.touch(&1);
    ///
    /// assert_eq!(freq.bucket_keys(1).copied().collect::<Vec<_>>(), vec![2, 3]);
    /// assert_eq!(freq.bucket_keys(2).copied().collect::<Vec<_>>(), vec![1]);
    /// assert_eq!(freq.bucket_keys(9).count(), 0);
    /// ```
    pub fn bucket_keys(&self, freq: u64) -> BucketKeys<'_, K> {
        BucketKeys {
            entries: &self.entries,
            cursor: self.buckets.get(&freq).and_then(|bucket| bucket.tail),
        }
    }

    /// Starts tracking `key` at frequency 1. Returns `false` if already tracked.
    pub fn insert(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }

        let id = self.entries.insert(Entry {
            prev: None,
            next: None,
            freq: 1,
            key: key.clone(),
        });
        self.index.insert(key, id);
        self.enter_first_bucket(id);
        true
    }

    /// Bumps `key` by one and returns the new frequency.
    ///
    /// At `u64::MAX` the frequency stays put but the key still moves to the
    /// head of its bucket.
    pub fn touch(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        let current = self.entries.get(id)?.freq;
        if current == u64::MAX {
            self.list_unlink(current, id)?;
            self.list_push_front(current, id);
            return Some(current);
        }

        let next_freq = current + 1;
        let detached = self.detach(id)?;

        if !self.buckets.contains_key(&next_freq) {
            // The old bucket is the new one's predecessor unless it was just dropped.
            let prev = if detached.bucket_dropped {
                detached.prev_bucket
            } else {
                Some(current)
            };
            self.insert_bucket(next_freq, prev, detached.next_bucket);
        }

        if let Some(entry) = self.entries.get_mut(id) {
            entry.freq = next_freq;
        }
        self.list_push_front(next_freq, id);
        if self.min_freq == 0 || next_freq < self.min_freq {
            self.min_freq = next_freq;
        }
        Some(next_freq)
    }

    /// Moves `key` back to frequency 1 and returns the frequency it had.
    pub fn reset(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        let previous = self.entries.get(id)?.freq;
        if previous == 1 {
            return Some(1);
        }

        self.detach(id)?;
        if let Some(entry) = self.entries.get_mut(id) {
            entry.freq = 1;
        }
        self.enter_first_bucket(id);
        Some(previous)
    }

    /// Stops tracking `key` and returns its last frequency.
    pub fn remove(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.detach(id)?;
        self.index.remove(key);
        self.entries.remove(id).map(|entry| entry.freq)
    }

    /// Removes the oldest arrival of the lowest bucket.
    pub fn pop_min(&mut self) -> Option<(K, u64)> {
        if self.min_freq == 0 {
            return None;
        }
        let id = self.buckets.get(&self.min_freq)?.tail?;
        self.detach(id)?;
        let entry = self.entries.remove(id)?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.freq))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.buckets.clear();
        self.min_freq = 0;
    }

    /// Verifies index, bucket lists, bucket chain and cursor agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError>
    where
        K: Debug,
    {
        ensure(self.entries.len() == self.index.len(), || {
            format!(
                "{} entries but {} indexed keys",
                self.entries.len(),
                self.index.len()
            )
        })?;

        if self.entries.is_empty() {
            ensure(self.buckets.is_empty(), || {
                format!("no keys but {} buckets remain", self.buckets.len())
            })?;
            return ensure(self.min_freq == 0, || {
                format!("no keys but min_freq is {}", self.min_freq)
            });
        }

        ensure(self.buckets.contains_key(&self.min_freq), || {
            format!("min_freq {} has no bucket", self.min_freq)
        })?;

        let mut listed = 0usize;
        for (&freq, bucket) in &self.buckets {
            ensure(freq >= self.min_freq, || {
                format!("bucket {freq} below min_freq {}", self.min_freq)
            })?;
            match bucket.prev {
                Some(prev) => ensure(
                    prev < freq && self.buckets.get(&prev).and_then(|b| b.next) == Some(freq),
                    || format!("bucket {freq} has a broken back link to {prev}"),
                )?,
                None => ensure(freq == self.min_freq, || {
                    format!("bucket {freq} has no predecessor but min_freq is {}", self.min_freq)
                })?,
            }
            if let Some(next) = bucket.next {
                ensure(
                    next > freq && self.buckets.get(&next).and_then(|b| b.prev) == Some(freq),
                    || format!("bucket {freq} has a broken forward link to {next}"),
                )?;
            }

            let mut cursor = bucket.head;
            let mut last = None;
            let mut count = 0usize;
            while let Some(id) = cursor {
                let entry = self
                    .entries
                    .get(id)
                    .ok_or_else(|| InvariantError::new(format!("bucket {freq} links a vacant slot")))?;
                ensure(entry.freq == freq, || {
                    format!("{:?} listed at freq {freq} but records {}", entry.key, entry.freq)
                })?;
                ensure(entry.prev == last, || {
                    format!("{:?} has a broken prev link in bucket {freq}", entry.key)
                })?;
                ensure(self.index.get(&entry.key) == Some(&id), || {
                    format!("{:?} in bucket {freq} is not indexed to its slot", entry.key)
                })?;
                count += 1;
                ensure(count <= self.entries.len(), || format!("bucket {freq} list is cyclic"))?;
                last = Some(id);
                cursor = entry.next;
            }
            ensure(count > 0, || format!("bucket {freq} is empty"))?;
            ensure(bucket.tail == last, || format!("bucket {freq} tail is stale"))?;
            listed += count;
        }

        ensure(listed == self.entries.len(), || {
            format!("{listed} keys in buckets but {} tracked", self.entries.len())
        })
    }

    /// Links a slot whose entry already has `freq == 1` into bucket 1.
    fn enter_first_bucket(&mut self, id: SlotId) {
        if !self.buckets.contains_key(&1) {
            let next = (self.min_freq != 0).then_some(self.min_freq);
            self.insert_bucket(1, None, next);
        }
        self.list_push_front(1, id);
        self.min_freq = 1;
    }

    /// Unlinks `id` from its bucket, dropping the bucket and advancing the
    /// cursor if the bucket becomes empty. The entry itself stays in the arena.
    fn detach(&mut self, id: SlotId) -> Option<Detached> {
        let freq = self.entries.get(id)?.freq;
        let (prev_bucket, next_bucket) = {
            let bucket = self.buckets.get(&freq)?;
            (bucket.prev, bucket.next)
        };

        self.list_unlink(freq, id)?;
        let bucket_dropped = self
            .buckets
            .get(&freq)
            .is_none_or(|bucket| bucket.head.is_none());
        if bucket_dropped {
            self.remove_bucket(freq, prev_bucket, next_bucket);
            if self.min_freq == freq {
                self.min_freq = next_bucket.unwrap_or(0);
            }
        }

        Some(Detached {
            freq,
            prev_bucket,
            next_bucket,
            bucket_dropped,
        })
    }

    fn insert_bucket(&mut self, freq: u64, prev: Option<u64>, next: Option<u64>) {
        self.buckets.insert(
            freq,
            Bucket {
                head: None,
                tail: None,
                prev,
                next,
            },
        );
        if let Some(bucket) = prev.and_then(|p| self.buckets.get_mut(&p)) {
            bucket.next = Some(freq);
        }
        if let Some(bucket) = next.and_then(|n| self.buckets.get_mut(&n)) {
            bucket.prev = Some(freq);
        }
    }

    fn remove_bucket(&mut self, freq: u64, prev: Option<u64>, next: Option<u64>) {
        if let Some(bucket) = prev.and_then(|p| self.buckets.get_mut(&p)) {
            bucket.next = next;
        }
        if let Some(bucket) = next.and_then(|n| self.buckets.get_mut(&n)) {
            bucket.prev = prev;
        }
        self.buckets.remove(&freq);
    }

    fn list_push_front(&mut self, freq: u64, id: SlotId) {
        let Some(bucket) = self.buckets.get_mut(&freq) else {
            return;
        };
        let old_head = bucket.head.replace(id);
        if old_head.is_none() {
            bucket.tail = Some(id);
        }

        if let Some(entry) = self.entries.get_mut(id) {
            entry.prev = None;
            entry.next = old_head;
        }
        if let Some(head) = old_head.and_then(|h| self.entries.get_mut(h)) {
            head.prev = Some(id);
        }
    }

    fn list_unlink(&mut self, freq: u64, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let entry = self.entries.get_mut(id)?;
            (entry.prev.take(), entry.next.take())
        };
        let bucket = self.buckets.get_mut(&freq)?;

        match prev {
            Some(p) => {
                if let Some(entry) = self.entries.get_mut(p) {
                    entry.next = next;
                }
            },
            None => bucket.head = next,
        }
        match next {
            Some(n) => {
                if let Some(entry) = self.entries.get_mut(n) {
                    entry.prev = prev;
                }
            },
            None => bucket.tail = prev,
        }
        Some(())
    }
}

impl<K> Default for FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over one bucket's keys, oldest arrival first.
#[derive(Debug)]
pub struct BucketKeys<'a, K> {
    entries: &'a SlotArena<Entry<K>>,
    cursor: Option<SlotId>,
}

impl<'a, K> Iterator for BucketKeys<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.get(self.cursor?)?;
        self.cursor = entry.prev;
        Some(&entry.key)
    }
}


#[cfg(test)]
mod property_tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;

    /// Straight-line model: key -> (freq, arrival stamp at that freq).
    #[derive(Default)]
    struct Model {
        keys: HashMap<u16, (u64, u64)>,
        clock: u64,
    }

    impl Model {
        fn stamp(&mut self) -> u64 {
            self.clock += 1;
            self.clock
        }

        fn victim(&self) -> Option<(u16, u64)> {
            self.keys
                .iter()
                .min_by_key(|(_, (freq, arrived))| (*freq, *arrived))
                .map(|(k, (freq, _))| (*k, *freq))
        }
    }

    proptest! {
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_matches_reference_model(
            ops in prop::collection::vec((0u8..5, 0u16..24), 0..200)
        ) {
            let mut freq = FrequencyBuckets::new();
            let mut model = Model::default();

            for (op, key) in ops {
                match op {
                    0 => {
                        let inserted = freq.insert(key);
                        prop_assert_eq!(inserted, !model.keys.contains_key(&key));
                        if inserted {
                            let t = model.stamp();
                            model.keys.insert(key, (1, t));
                        }
                    }
                    1 => {
                        let got = freq.touch(&key);
                        let t = model.stamp();
                        let expected = model.keys.get_mut(&key).map(|entry| {
                            *entry = (entry.0 + 1, t);
                            entry.0
                        });
                        prop_assert_eq!(got, expected);
                    }
                    2 => {
                        prop_assert_eq!(freq.remove(&key), model.keys.remove(&key).map(|(f, _)| f));
                    }
                    3 => {
                        let expected = model.victim();
                        prop_assert_eq!(freq.pop_min(), expected);
                        if let Some((k, _)) = expected {
                            model.keys.remove(&k);
                        }
                    }
                    _ => {
                        let got = freq.reset(&key);
                        let expected = model.keys.get(&key).map(|(f, _)| *f);
                        prop_assert_eq!(got, expected);
                        if let Some(f) = expected.filter(|f| *f != 1) {
                            let t = model.stamp();
                            model.keys.insert(key, (1, t));
                            prop_assert_eq!(f, got.unwrap());
                        }
                    }
                }

                prop_assert!(freq.check_invariants().is_ok());
                prop_assert_eq!(freq.len(), model.keys.len());
                prop_assert_eq!(
                    freq.min_freq(),
                    model.keys.values().map(|(f, _)| *f).min()
                );
            }
        }

        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_draining_leaves_empty_state(
            keys in prop::collection::vec(any::<u32>(), 0..40),
            touches in prop::collection::vec(any::<prop::sample::Index>(), 0..40)
        ) {
            let mut freq = FrequencyBuckets::new();
            for key in &keys {
                freq.insert(*key);
            }
            if !keys.is_empty() {
                for idx in touches {
                    freq.touch(idx.get(&keys));
                }
            }

            let mut last = 0u64;
            while let Some((_, f)) = freq.pop_min() {
                prop_assert!(f >= last);
                last = f;
            }
            prop_assert!(freq.is_empty());
            prop_assert_eq!(freq.min_freq(), None);
            prop_assert_eq!(freq.bucket_count(), 0);
            prop_assert!(freq.check_invariants().is_ok());
        }
    }
}
