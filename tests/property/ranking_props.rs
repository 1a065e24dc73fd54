//! Ranking invariants: score bounds, ordering, determinism, limits.

use crate::common::make_index;
use geomsaek::{SearchPolicy, SimilarityOptions};
use proptest::prelude::*;

fn syllable() -> impl Strategy<Value = char> {
    (0xAC00u32..=0xD7A3).prop_map(|cp| char::from_u32(cp).unwrap())
}

fn hangul_word() -> impl Strategy<Value = String> {
    prop::collection::vec(syllable(), 1..6).prop_map(|cs| cs.into_iter().collect())
}

fn word_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(hangul_word(), 1..24)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn totals_are_clipped_and_ordered(words in word_list(), query in hangul_word()) {
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let index = make_index(&refs, SearchPolicy::default());
        let results = index.search_similar(
            &query,
            &SimilarityOptions { minimum_score: 0.0, ..Default::default() },
        );

        for pair in results.windows(2) {
            // Descending by total; ties ascending by index.
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].index < pair[1].index);
            }
        }
        for r in &results {
            prop_assert!((0.0..=1.0).contains(&r.score));
            prop_assert_eq!(r.score, r.breakdown.total);
        }
    }

    #[test]
    fn limit_is_respected(words in word_list(), query in hangul_word(), limit in 1usize..8) {
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let index = make_index(&refs, SearchPolicy::default());
        let results = index.search_similar(
            &query,
            &SimilarityOptions { limit, minimum_score: 0.0, ..Default::default() },
        );
        prop_assert!(results.len() <= limit);
    }

    #[test]
    fn results_clear_the_minimum_score(
        words in word_list(),
        query in hangul_word(),
        min in 0.0f64..1.0,
    ) {
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let index = make_index(&refs, SearchPolicy::default());
        let results = index.search_similar(
            &query,
            &SimilarityOptions { minimum_score: min, ..Default::default() },
        );
        for r in &results {
            prop_assert!(r.score >= min);
        }
    }

    #[test]
    fn identical_query_always_wins(words in word_list(), pick in 0usize..24) {
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let index = make_index(&refs, SearchPolicy::default());
        let target = &words[pick % words.len()];
        let results = index.search_similar(
            target,
            &SimilarityOptions { limit: 24, minimum_score: 0.0, ..Default::default() },
        );
        prop_assert!(!results.is_empty());
        // The key equal to the query scores a clipped 1.0 and sits in the
        // top tier (other keys may clip to 1.0 too; ties break by index).
        prop_assert_eq!(results[0].score, 1.0);
        let target_norm = geomsaek::normalized_search_token(target);
        prop_assert!(results
            .iter()
            .any(|r| r.score == 1.0
                && geomsaek::normalized_search_token(&r.key) == target_norm));
    }

    #[test]
    fn ranking_is_deterministic(words in word_list(), query in hangul_word()) {
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let index = make_index(&refs, SearchPolicy::default());
        let opts = SimilarityOptions { minimum_score: 0.0, ..Default::default() };
        let first: Vec<(usize, u64)> = index
            .search_similar(&query, &opts)
            .iter()
            .map(|r| (r.index, r.score.to_bits()))
            .collect();
        let second: Vec<(usize, u64)> = index
            .search_similar(&query, &opts)
            .iter()
            .map(|r| (r.index, r.score.to_bits()))
            .collect();
        prop_assert_eq!(first, second);
    }
}
