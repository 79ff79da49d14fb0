//! Builds an LRU cache through the builder and compares it with LFU.

use freqcache::builder::{CacheBuilder, CacheConfig, CachePolicy};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = CacheConfig::lru(3);
    let lru = CacheBuilder::from(config).build::<u32, &str>(config.policy);
    let lfu = CacheBuilder::new(3).build::<u32, &str>(CachePolicy::Lfu);

    for cache in [&lru, &lfu] {
        cache.put(1, "one");
        for _ in 0..5 {
            cache.get(&1);
        }
        cache.put(2, "two");
        cache.put(3, "three");
        cache.put(4, "four");
        cache.put(5, "five");
        println!(
            "{:?}: key 1 {}",
            cache.policy(),
            if cache.contains(&1) { "kept" } else { "evicted" }
        );
    }

    match CacheBuilder::new(0).try_build::<u32, &str>(CachePolicy::Lru) {
        Ok(_) => println!("unexpected: zero capacity accepted"),
        Err(err) => println!("rejected: {err}"),
    }
}
