//! The three index strategies must be observationally equivalent.

use crate::common::{all_strategies, KOREAN_WORDS};
use geomsaek::{CachePolicy, IndexStrategy, MatchMode, SearchPolicy, WarmupPolicy};

#[test]
fn strategies_agree_on_every_mode() {
    let indexes = all_strategies(&KOREAN_WORDS);
    let queries = ["ㅍㄹ", "ㅍㄹㅌㅇㄷ", "ㄱㅅ", "ㅂㅇㄷ", "없는쿼리"];
    for query in queries {
        for mode in [MatchMode::Contains, MatchMode::Prefix, MatchMode::Exact] {
            let reference: Vec<&String> = indexes[0].search(query, mode);
            for index in &indexes[1..] {
                assert_eq!(
                    index.search(query, mode),
                    reference,
                    "strategy disagreement on {query:?} {mode:?}"
                );
            }
        }
    }
}

#[test]
fn strategies_agree_on_similar_ranking() {
    let indexes = all_strategies(&KOREAN_WORDS);
    let reference: Vec<(usize, String)> = indexes[0]
        .search_similar("검삭", &Default::default())
        .into_iter()
        .map(|r| (r.index, r.key))
        .collect();
    assert!(!reference.is_empty());
    for index in &indexes[1..] {
        let got: Vec<(usize, String)> = index
            .search_similar("검삭", &Default::default())
            .into_iter()
            .map(|r| (r.index, r.key))
            .collect();
        assert_eq!(got, reference);
    }
}

#[test]
fn background_warmup_converges_to_same_results() {
    let policy = SearchPolicy {
        strategy: IndexStrategy::LazyCache,
        warmup: WarmupPolicy::Background,
        ..Default::default()
    };
    let index = crate::common::make_index(&KOREAN_WORDS, policy);
    // Query immediately; whether the background build has finished or not,
    // the answer must be the same.
    let hits = index.search("ㅍㄹ", MatchMode::Prefix);
    assert_eq!(hits.len(), 2); // 프론트엔드, 프론트
}

#[test]
fn cacheless_policy_still_works() {
    let policy = SearchPolicy {
        cache: CachePolicy::None,
        ..Default::default()
    };
    let index = crate::common::make_index(&KOREAN_WORDS, policy);
    let first = index.search("ㄱㅅ", MatchMode::Contains);
    let second = index.search("ㄱㅅ", MatchMode::Contains);
    assert_eq!(first, second);
    assert_eq!(index.telemetry_snapshot().cache_hit_count, 0);
}

#[test]
fn ngram_sizes_clamp_and_agree() {
    let queries = ["ㄱㅅ", "ㅍㄹㅌ"];
    for k in [0, 1, 2, 3, 7] {
        let policy = SearchPolicy {
            strategy: IndexStrategy::Ngram(k),
            ..Default::default()
        };
        let index = crate::common::make_index(&KOREAN_WORDS, policy);
        for query in queries {
            let baseline = crate::common::make_index(&KOREAN_WORDS, SearchPolicy::default());
            assert_eq!(
                index.search(query, MatchMode::Contains),
                baseline.search(query, MatchMode::Contains),
                "ngram({k}) disagrees on {query:?}"
            );
        }
    }
}
