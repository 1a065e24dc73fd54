//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides canonical fixtures so the suites don't each grow their own
//! slightly different word lists.

#![doc(hidden)]

use crate::index::SearchIndex;
use crate::types::{IndexStrategy, SearchPolicy};

/// The canonical mixed Korean word list used across the suites.
pub const KOREAN_WORDS: [&str; 8] = [
    "프론트엔드",
    "백엔드",
    "데이터",
    "검색",
    "개발",
    "결제",
    "검사",
    "프론트",
];

/// Latin keys for wrong-keyboard-mode scenarios.
pub const LATIN_WORDS: [&str; 3] = ["search", "service", "season"];

/// Index over string items whose key is the item itself.
pub fn make_index(keys: &[&str], policy: SearchPolicy) -> SearchIndex<String> {
    SearchIndex::new(
        keys.iter().map(|s| s.to_string()).collect(),
        |s| s.clone(),
        policy,
    )
}

/// Same collection under every index strategy, for parity tests.
pub fn all_strategies(keys: &[&str]) -> Vec<SearchIndex<String>> {
    [
        IndexStrategy::Precompute,
        IndexStrategy::LazyCache,
        IndexStrategy::Ngram(2),
        IndexStrategy::Ngram(3),
    ]
    .into_iter()
    .map(|strategy| {
        make_index(
            keys,
            SearchPolicy {
                strategy,
                ..Default::default()
            },
        )
    })
    .collect()
}
