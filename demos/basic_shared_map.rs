//! Counts words from several threads with a `SharedMap`.

use std::thread;

use freqcache::store::SharedMap;

fn main() {
    let text = [
        "the quick brown fox",
        "jumps over the lazy dog",
        "the dog sleeps",
    ];
    let counts: SharedMap<String, usize> = SharedMap::new();

    thread::scope(|s| {
        for line in text {
            let counts = counts.clone();
            s.spawn(move || {
                for word in line.split_whitespace() {
                    counts.merge(word.to_string(), 1, |old, new| Some(old + new));
                }
            });
        }
    });

    let total = counts.reduce(0, |acc, _, n| acc + n);
    let repeated = counts.filter(|_, n| *n > 1);
    println!("{} distinct words, {total} total", counts.len());
    println!("repeated: {repeated:?}");

    let frozen = counts.frozen();
    counts.clear();
    println!("frozen copy still has 'the' = {:?}", frozen.get("the"));
}
