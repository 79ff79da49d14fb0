pub mod shared_map;

pub use shared_map::{FrozenMap, SharedMap};
