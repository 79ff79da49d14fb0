pub use crate::builder::{Cache, CacheBuilder, CacheConfig, CachePolicy};
pub use crate::ds::{FrequencyBuckets, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::policy::lfu::{ConcurrentLfuCache, LfuCore};
pub use crate::policy::lru::ConcurrentLruCache;
pub use crate::store::{FrozenMap, SharedMap};
pub use crate::traits::{ConcurrentCache, CoreCache, LfuCacheTrait, MutableCache};
