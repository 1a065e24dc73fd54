//! Cancellable variants: parity with sync, clean propagation, telemetry.

use crate::common::{mixed_index, synthetic_index};
use geomsaek::{CancellationToken, MatchMode, Operation, SimilarityOptions};

#[test]
fn uncancelled_token_gives_sync_parity() {
    let index = mixed_index();
    let token = CancellationToken::new();

    for query in ["ㅍㄹ", "ㄱㅅ", "sea"] {
        for mode in [MatchMode::Contains, MatchMode::Prefix, MatchMode::Exact] {
            assert_eq!(
                index.search_cancellable(query, mode, &token).unwrap(),
                index.search(query, mode)
            );
        }
    }

    let opts = SimilarityOptions::default();
    let sync: Vec<usize> = index
        .search_similar("검삭", &opts)
        .into_iter()
        .map(|r| r.index)
        .collect();
    let cancellable: Vec<usize> = index
        .search_similar_cancellable("검삭", &opts, &token)
        .unwrap()
        .into_iter()
        .map(|r| r.index)
        .collect();
    assert_eq!(sync, cancellable);
}

#[test]
fn pre_cancelled_token_stops_everything() {
    let index = synthetic_index(1000);
    let token = CancellationToken::new();
    token.cancel();

    assert!(index
        .search_cancellable("ㄱㅅ", MatchMode::Contains, &token)
        .is_err());
    assert!(index
        .search_similar_cancellable("ㄱㅅ", &Default::default(), &token)
        .is_err());
    assert!(index
        .explain_similar_cancellable("ㄱㅅ", &Default::default(), &token)
        .is_err());

    let snap = index.telemetry_snapshot();
    assert_eq!(snap.operation(Operation::SearchCancellable).cancelled, 1);
    assert_eq!(snap.operation(Operation::SimilarCancellable).cancelled, 1);
    assert_eq!(snap.operation(Operation::ExplainCancellable).cancelled, 1);
    assert_eq!(snap.operation(Operation::SearchCancellable).success, 0);
}

#[test]
fn cancellation_mid_flight_stops_a_worker_thread() {
    use std::sync::Arc;
    let index = Arc::new(synthetic_index(20_000));
    let token = CancellationToken::new();

    let worker = {
        let index = Arc::clone(&index);
        let token = token.clone();
        std::thread::spawn(move || {
            // Keep issuing queries until one observes the cancellation.
            loop {
                if index
                    .search_similar_cancellable("ㄱㄴㄷ", &Default::default(), &token)
                    .is_err()
                {
                    return true;
                }
            }
        })
    };

    std::thread::sleep(std::time::Duration::from_millis(20));
    token.cancel();
    assert!(worker.join().unwrap());
}

#[test]
fn cancelled_query_does_not_poison_the_cache() {
    let index = mixed_index();
    let token = CancellationToken::new();
    token.cancel();
    let _ = index.search_cancellable("ㅍㄹ", MatchMode::Prefix, &token);

    // A fresh sync query must compute (miss), not read a cancelled partial.
    let hits = index.search("ㅍㄹ", MatchMode::Prefix);
    assert_eq!(hits.len(), 2);
    // Second call is the first legitimate cache hit.
    index.search("ㅍㄹ", MatchMode::Prefix);
    assert_eq!(index.telemetry_snapshot().cache_hit_count, 1);
}
