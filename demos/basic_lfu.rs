//! Walks through LFU eviction order with a two-entry cache.
//!
//! Run with `RUST_LOG=trace` to see the eviction events.

use freqcache::policy::lfu::ConcurrentLfuCache;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cache = ConcurrentLfuCache::new(2);
    cache.put("A", 1);
    cache.put("B", 2);
    println!("after put A, B: A={:?} B={:?}", cache.frequency(&"A"), cache.frequency(&"B"));

    cache.get(&"A");
    println!("after get A:    A={:?} B={:?}", cache.frequency(&"A"), cache.frequency(&"B"));

    cache.put("C", 3);
    println!("after put C:    B present? {}", cache.contains(&"B"));

    cache.put("A", 10);
    println!(
        "overwrite A:    value={:?} freq={:?}",
        cache.peek(&"A").as_deref(),
        cache.frequency(&"A")
    );

    if let Some((key, value)) = cache.peek_lfu() {
        println!("next victim:    {key} -> {value}");
    }

    let degenerate: ConcurrentLfuCache<&str, i32> = ConcurrentLfuCache::new(0);
    degenerate.put("x", 1);
    println!("capacity 0:     len={}", degenerate.len());
}
