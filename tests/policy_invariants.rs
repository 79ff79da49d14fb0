// ==============================================
// CROSS-POLICY INVARIANT TESTS (integration)
// ==============================================
//
// Behavior every policy handed out by the builder must share.

use freqcache::builder::{CacheBuilder, CachePolicy};

const POLICIES: [CachePolicy; 2] = [CachePolicy::Lfu, CachePolicy::Lru];

// ==============================================
// Capacity Bound
// ==============================================

mod capacity_bound {
    use super::*;

    #[test]
    fn len_never_exceeds_capacity() {
        for policy in POLICIES {
            let cache = CacheBuilder::new(5).build::<u32, u32>(policy);
            for i in 0..100 {
                cache.put(i % 17, i);
                if i % 3 == 0 {
                    cache.get(&(i % 7));
                }
                assert!(cache.len() <= 5, "{policy:?} exceeded capacity");
            }
            assert_eq!(cache.len(), 5);
        }
    }

    #[test]
    fn overwrite_does_not_evict() {
        for policy in POLICIES {
            let cache = CacheBuilder::new(2).build::<&str, u8>(policy);
            cache.put("a", 1);
            cache.put("b", 2);
            cache.put("a", 3);
            assert!(cache.contains(&"a"), "{policy:?}");
            assert!(cache.contains(&"b"), "{policy:?}");
        }
    }

    #[test]
    fn capacity_plus_one_distinct_keys_evicts_first() {
        for policy in POLICIES {
            let cache = CacheBuilder::new(3).build::<u8, u8>(policy);
            for k in 0..4 {
                cache.put(k, k);
            }
            assert!(!cache.contains(&0), "{policy:?}");
            for k in 1..4 {
                assert!(cache.contains(&k), "{policy:?}");
            }
        }
    }
}

// ==============================================
// Capacity-0 Behavior
// ==============================================

mod zero_capacity {
    use super::*;

    #[test]
    fn capacity_zero_is_honored() {
        for policy in POLICIES {
            let cache = CacheBuilder::new(0).build::<&str, i32>(policy);
            assert_eq!(cache.capacity(), 0, "{policy:?}");
        }
    }

    #[test]
    fn capacity_zero_rejects_inserts() {
        for policy in POLICIES {
            let cache = CacheBuilder::new(0).build::<&str, i32>(policy);
            assert_eq!(cache.insert("key", 42), None);
            assert_eq!(cache.len(), 0, "{policy:?}");
            assert!(cache.get(&"key").is_none());
        }
    }

    #[test]
    fn negative_capacity_behaves_like_zero() {
        for policy in POLICIES {
            let cache = CacheBuilder::new(-7).build::<&str, i32>(policy);
            cache.put("key", 1);
            assert!(cache.is_empty(), "{policy:?}");
        }
    }

    #[test]
    fn try_build_refuses_zero() {
        for policy in POLICIES {
            assert!(CacheBuilder::new(0).try_build::<u8, u8>(policy).is_err());
        }
    }
}

// ==============================================
// Read Semantics
// ==============================================

mod reads {
    use super::*;

    #[test]
    fn missing_key_has_no_side_effects() {
        for policy in POLICIES {
            let cache = CacheBuilder::new(2).build::<u8, u8>(policy);
            cache.put(1, 1);
            cache.put(2, 2);
            for _ in 0..10 {
                assert!(cache.get(&9).is_none());
            }
            cache.put(3, 3);
            assert_eq!(cache.len(), 2, "{policy:?}");
            assert!(!cache.contains(&1), "{policy:?}");
        }
    }

    #[test]
    fn get_returns_last_written_value() {
        for policy in POLICIES {
            let cache = CacheBuilder::new(4).build::<u8, String>(policy);
            cache.put(1, "first".into());
            cache.put(1, "second".into());
            assert_eq!(
                cache.get(&1).as_deref().map(String::as_str),
                Some("second"),
                "{policy:?}"
            );
        }
    }
}
