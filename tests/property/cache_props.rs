//! LRU cache laws: size bounds and eviction order.

use geomsaek::LruCache;
use proptest::prelude::*;

proptest! {
    #[test]
    fn size_is_min_of_distinct_inserts_and_capacity(
        capacity in 1usize..16,
        count in 0usize..48,
    ) {
        let cache = LruCache::new(capacity);
        for i in 0..count {
            cache.insert(i, i);
        }
        prop_assert_eq!(cache.len(), count.min(capacity));
    }

    #[test]
    fn evicted_entry_is_least_recently_touched(
        capacity in 2usize..8,
        touches in prop::collection::vec(0usize..8, 0..32),
    ) {
        let cache = LruCache::new(capacity);
        // Model recency with a vector: most recent at the back.
        let mut recency: Vec<usize> = Vec::new();

        let mut touch = |key: usize, recency: &mut Vec<usize>| {
            recency.retain(|&k| k != key);
            recency.push(key);
            if recency.len() > capacity {
                recency.remove(0);
            }
        };

        for (step, &key) in touches.iter().enumerate() {
            if step % 2 == 0 {
                cache.insert(key, key);
                touch(key, &mut recency);
            } else if cache.get(&key).is_some() {
                touch(key, &mut recency);
            }
        }

        // Exactly the modeled keys must be present.
        for key in 0..8 {
            prop_assert_eq!(
                cache.get(&key).is_some(),
                recency.contains(&key),
                "divergence on key {}", key
            );
        }
    }

    #[test]
    fn get_after_insert_round_trips(keys in prop::collection::vec(0usize..100, 1..20)) {
        let cache = LruCache::new(keys.len());
        for &k in &keys {
            cache.insert(k, k * 10);
        }
        // The most recently inserted key is always retrievable.
        let last = *keys.last().unwrap();
        prop_assert_eq!(cache.get(&last), Some(last * 10));
    }
}
