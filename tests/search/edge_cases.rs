//! Degenerate inputs: everything is total, nothing throws.

use crate::common::{make_index, KOREAN_WORDS};
use geomsaek::{MatchMode, SearchPolicy, SimilarityOptions};

#[test]
fn empty_collection() {
    let index = make_index(&[], SearchPolicy::default());
    assert_eq!(index.len(), 0);
    assert!(index.search("ㄱ", MatchMode::Contains).is_empty());
    assert!(index
        .search_similar("검색", &SimilarityOptions::default())
        .is_empty());
}

#[test]
fn empty_and_whitespace_queries() {
    let index = make_index(&KOREAN_WORDS, SearchPolicy::default());
    for query in ["", " ", "\t\n", "   "] {
        assert!(index.search(query, MatchMode::Contains).is_empty());
        assert!(index
            .search_similar(query, &SimilarityOptions::default())
            .is_empty());
    }
}

#[test]
fn oversize_query_is_truncated_not_rejected() {
    let policy = SearchPolicy {
        max_query_len: Some(4),
        ..Default::default()
    };
    let index = make_index(&["프론트엔드"], policy);
    // Truncated to 프론트엔 → projection ㅍㄹㅌㅇ, still a prefix.
    let hits = index.search("프론트엔드게임", MatchMode::Prefix);
    assert_eq!(hits.len(), 1);
}

#[test]
fn punctuation_only_query() {
    let index = make_index(&KOREAN_WORDS, SearchPolicy::default());
    assert!(index.search("!!!", MatchMode::Contains).is_empty());
}

#[test]
fn query_longer_than_any_key() {
    let index = make_index(&["검색"], SearchPolicy::default());
    assert!(index
        .search("ㄱㅅㄱㅅㄱㅅㄱㅅㄱㅅ", MatchMode::Contains)
        .is_empty());
}

#[test]
fn duplicate_keys_are_all_returned() {
    let index = make_index(&["검색", "검색", "검색"], SearchPolicy::default());
    assert_eq!(index.search("ㄱㅅ", MatchMode::Exact).len(), 3);
}

#[test]
fn zero_limit_similar_coerces_to_one() {
    let index = make_index(&KOREAN_WORDS, SearchPolicy::default());
    let results = index.search_similar(
        "검색",
        &SimilarityOptions {
            limit: 0,
            ..Default::default()
        },
    );
    assert_eq!(results.len(), 1);
}

#[test]
fn minimum_score_of_one_keeps_only_exact() {
    let index = make_index(&["검색", "검사"], SearchPolicy::default());
    let results = index.search_similar(
        "검색",
        &SimilarityOptions {
            minimum_score: 1.0,
            ..Default::default()
        },
    );
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key, "검색");
}

#[test]
fn mixed_script_keys_and_queries() {
    let index = make_index(&["서울2호선", "부산1호선"], SearchPolicy::default());
    let hits = index.search("ㅅㅇ2", MatchMode::Prefix);
    assert_eq!(hits, vec![&"서울2호선".to_string()]);
}
