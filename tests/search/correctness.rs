//! Core matching semantics across modes and key scripts.

use crate::common::{make_index, mixed_index};
use geomsaek::{MatchMode, SearchPolicy, SimilarityOptions};

#[test]
fn contains_matches_inner_choseong() {
    let index = make_index(&["프론트엔드", "백엔드", "데이터"], SearchPolicy::default());
    let hits = index.search("ㄹㅌ", MatchMode::Contains);
    assert_eq!(hits, vec![&"프론트엔드".to_string()]);
}

#[test]
fn prefix_respects_word_start() {
    let index = make_index(&["프론트", "프론트엔드", "백엔드"], SearchPolicy::default());
    let hits = index.search("ㅍㄹㅌ", MatchMode::Prefix);
    assert_eq!(hits.len(), 2);
    let hits = index.search("ㄹㅌ", MatchMode::Prefix);
    assert!(hits.is_empty());
}

#[test]
fn exact_requires_full_projection() {
    let index = make_index(&["프론트", "프론트엔드"], SearchPolicy::default());
    let hits = index.search("ㅍㄹㅌㅇㄷ", MatchMode::Exact);
    assert_eq!(hits, vec![&"프론트엔드".to_string()]);
    assert!(index.search("ㅍㄹㅌㅇ", MatchMode::Exact).is_empty());
}

#[test]
fn syllable_queries_project_like_choseong_queries() {
    let index = make_index(&["프론트엔드", "백엔드"], SearchPolicy::default());
    let from_choseong = index.search("ㅍㄹㅌ", MatchMode::Contains);
    let from_syllables = index.search("프론트", MatchMode::Contains);
    assert_eq!(from_choseong, from_syllables);
}

#[test]
fn latin_keys_match_latin_queries() {
    let index = mixed_index();
    let hits = index.search("sea", MatchMode::Prefix);
    assert_eq!(hits.len(), 2); // search, season
    let hits = index.search("SEARCH", MatchMode::Exact);
    assert_eq!(hits, vec![&"search".to_string()]);
}

#[test]
fn results_preserve_item_order() {
    let index = make_index(&["검사", "검색", "개검"], SearchPolicy::default());
    let hits = index.search("ㄱ", MatchMode::Contains);
    assert_eq!(
        hits,
        vec![
            &"검사".to_string(),
            &"검색".to_string(),
            &"개검".to_string()
        ]
    );
}

#[test]
fn similar_search_surfaces_typos() {
    let index = make_index(&["검색", "개발", "결제", "검사"], SearchPolicy::default());
    let results = index.search_similar(
        "검삭",
        &SimilarityOptions {
            limit: 3,
            minimum_score: 0.3,
            ..Default::default()
        },
    );
    assert_eq!(results[0].key, "검색");
    assert!(results[0].score > 0.5);
}

#[test]
fn explain_reports_the_winning_breakdown() {
    let index = make_index(&["검색", "검사"], SearchPolicy::default());
    let results = index.explain_similar("검삭", &SimilarityOptions::default());
    assert!(!results.is_empty());
    let top = &results[0];
    assert_eq!(top.score, top.breakdown.total);
    assert_eq!(top.detail.target_choseong, "ㄱㅅ");
    assert_eq!(top.detail.jamo_distance, 1);
}
