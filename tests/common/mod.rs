//! Shared test utilities and fixtures.

#![allow(dead_code)]

use geomsaek::{IndexStrategy, SearchIndex, SearchPolicy};

// Re-export canonical fixtures from geomsaek::testing.
pub use geomsaek::testing::{all_strategies, make_index, KOREAN_WORDS, LATIN_WORDS};

/// Index over a mixed Korean/Latin collection, default policy.
pub fn mixed_index() -> SearchIndex<String> {
    let mut words: Vec<&str> = KOREAN_WORDS.to_vec();
    words.extend(LATIN_WORDS);
    make_index(&words, SearchPolicy::default())
}

/// A larger synthetic collection for prefilter/gate paths.
pub fn synthetic_index(count: usize) -> SearchIndex<String> {
    let keys: Vec<String> = (0..count)
        .map(|i| {
            let mut key = String::new();
            let mut state = (i as u64).wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(1);
            for _ in 0..3 {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let l = (state % 19) as usize;
                let v = ((state >> 8) % 21) as usize;
                let t = ((state >> 16) % 28) as usize;
                if let Some(c) = geomsaek::compose(l, v, t) {
                    key.push(c);
                }
            }
            key
        })
        .collect();
    let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    make_index(
        &refs,
        SearchPolicy {
            strategy: IndexStrategy::Precompute,
            ..Default::default()
        },
    )
}
