//! Bytewise determinism across runs and threads.

use crate::common::synthetic_index;
use geomsaek::{MatchMode, SimilarityOptions};
use std::sync::Arc;

fn result_signature(results: &[geomsaek::ScoredSearchResult]) -> Vec<(usize, u64, String)> {
    results
        .iter()
        .map(|r| (r.index, r.score.to_bits(), r.variant.clone()))
        .collect()
}

#[test]
fn similar_search_is_bitwise_deterministic() {
    let index = synthetic_index(2000);
    let opts = SimilarityOptions {
        minimum_score: 0.0,
        ..Default::default()
    };
    let reference = result_signature(&index.search_similar("가나다", &opts));
    for _ in 0..10 {
        assert_eq!(
            result_signature(&index.search_similar("가나다", &opts)),
            reference
        );
    }
}

#[test]
fn similar_search_is_deterministic_across_threads() {
    let index = Arc::new(synthetic_index(2000));
    let opts = SimilarityOptions {
        minimum_score: 0.0,
        ..Default::default()
    };
    let reference = result_signature(&index.search_similar("가나다", &opts));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let index = Arc::clone(&index);
            let opts = opts.clone();
            let reference = reference.clone();
            std::thread::spawn(move || {
                for _ in 0..5 {
                    assert_eq!(
                        result_signature(&index.search_similar("가나다", &opts)),
                        reference
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn plain_search_is_deterministic_under_concurrency() {
    let index = Arc::new(synthetic_index(2000));
    let reference: Vec<String> = index
        .search("가", MatchMode::Contains)
        .into_iter()
        .cloned()
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let index = Arc::clone(&index);
            let reference = reference.clone();
            std::thread::spawn(move || {
                for _ in 0..20 {
                    let got: Vec<String> = index
                        .search("가", MatchMode::Contains)
                        .into_iter()
                        .cloned()
                        .collect();
                    assert_eq!(got, reference);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn scores_stay_in_unit_interval() {
    let index = synthetic_index(500);
    for query in ["가나", "각난닫", "ㄱㄴㄷ", "rkskek"] {
        for result in index.search_similar(
            query,
            &SimilarityOptions {
                minimum_score: 0.0,
                ..Default::default()
            },
        ) {
            assert!((0.0..=1.0).contains(&result.score), "score {}", result.score);
            let b = &result.breakdown;
            let reconstructed =
                (b.weighted_core + b.exact_bonus + b.prefix_bonus).clamp(0.0, 1.0);
            assert!((result.score - reconstructed).abs() < 1e-12);
        }
    }
}
