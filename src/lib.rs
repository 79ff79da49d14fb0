//! freqcache: thread-safe fixed-capacity caches.
//!
//! The centerpiece is an O(1) LFU cache ([`policy::lfu`]). Entries are
//! grouped into frequency buckets, each bucket orders its keys by arrival,
//! and a min-frequency cursor points at the next bucket to evict from.
//! Around it sit an LRU cache ([`policy::lru`]), a concurrent associative
//! map ([`store::SharedMap`]), and a builder that picks a policy from
//! configuration ([`builder`]).
//!
//! ```
//! use freqcache::prelude::*;
//!
//! let cache = ConcurrentLfuCache::new(2);
//! cache.put("A", 1);
//! cache.put("B", 2);
//! cache.get(&"A");
//! cache.put("C", 3);
//!
//! assert!(cache.get(&"B").is_none());
//! assert_eq!(cache.frequency(&"A"), Some(2));
//! ```
//!
//! The library emits `tracing` events (evictions at `trace`, degenerate
//! construction and `clear` at `debug`) and never installs a subscriber.

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod store;
pub mod traits;

pub use crate::builder::{Cache, CacheBuilder, CacheConfig, CachePolicy};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::policy::lfu::{ConcurrentLfuCache, LfuCore};
pub use crate::policy::lru::ConcurrentLruCache;
pub use crate::store::{FrozenMap, SharedMap};
