// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The search index: items, derived keys, and candidate lookup.
//!
//! Built once from a collection and a key projection, immutable afterwards.
//! What varies is how much work happens up front, chosen by
//! [`IndexStrategy`](crate::types::IndexStrategy):
//!
//! - **Precompute** projects every key to its choseong string at
//!   construction. Queries scan the vector.
//! - **LazyCache** skips the projection pass and lets the first query (or a
//!   background warmup) pay for it, coordinated by [`crate::materialize`].
//! - **Ngram(k)** additionally builds an inverted index from each k-gram of
//!   a projection to the sorted list of item indices containing it.
//!   Candidate lookup intersects posting lists by sorted merge, which turns
//!   `Contains` queries on large collections from O(n) scans into a few
//!   list walks.
//!
//! The items, raw keys, normalized keys, projections, and postings never
//! change after construction, so queries share them without locking. The
//! only mutable pieces — the LRU result cache, the lazy key cell, and the
//! telemetry counters — guard themselves.

mod query;

use crate::cache::LruCache;
use crate::cancel::{Cancelled, CancellationToken, CANDIDATE_CHECKPOINT_INTERVAL};
use crate::choseong::{choseong, normalized_search_token, ChoseongOptions};
use crate::materialize::LazyKeys;
use crate::telemetry::{Telemetry, TelemetrySnapshot};
use crate::types::{CachePolicy, IndexStrategy, SearchPolicy, WarmupPolicy};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// =============================================================================
// N-GRAM INVERTED INDEX
// =============================================================================

/// Inverted index from choseong k-grams to sorted posting lists.
///
/// # Invariants
///
/// - Every posting list is sorted ascending with no duplicates (construction
///   walks items in index order and dedups grams per key).
/// - `k ∈ {2, 3}`.
pub(crate) struct NgramIndex {
    k: usize,
    postings: HashMap<String, Vec<usize>>,
}

impl NgramIndex {
    fn build(keys: &[String], k: usize) -> Self {
        let mut postings: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, key) in keys.iter().enumerate() {
            let chars: Vec<char> = key.chars().collect();
            if chars.len() < k {
                continue;
            }
            let mut seen: HashSet<String> = HashSet::new();
            for window in chars.windows(k) {
                let gram: String = window.iter().collect();
                if seen.insert(gram.clone()) {
                    postings.entry(gram).or_default().push(idx);
                }
            }
        }
        Self { k, postings }
    }

    /// Indices whose projection contains every distinct k-gram of the query.
    ///
    /// `None` means the query is too short to produce grams — the caller
    /// falls back to scanning everything. `Some(empty)` is a definitive
    /// miss.
    fn candidates(&self, query: &str) -> Option<Vec<usize>> {
        let chars: Vec<char> = query.chars().collect();
        if chars.len() < self.k {
            return None;
        }

        let mut grams: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for window in chars.windows(self.k) {
            let gram: String = window.iter().collect();
            if seen.insert(gram.clone()) {
                grams.push(gram);
            }
        }

        let mut result: Option<Vec<usize>> = None;
        for gram in &grams {
            let postings = match self.postings.get(gram) {
                Some(p) => p.as_slice(),
                None => return Some(Vec::new()),
            };
            result = Some(match result {
                None => postings.to_vec(),
                Some(current) => intersect_sorted(&current, postings),
            });
            if matches!(result.as_deref(), Some([])) {
                break;
            }
        }
        result
    }
}

/// Intersection of two ascending index lists by sorted merge.
fn intersect_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

// =============================================================================
// THE INDEX
// =============================================================================

/// Immutable searchable collection with choseong and similarity queries.
pub struct SearchIndex<T> {
    items: Vec<T>,
    raw_keys: Vec<String>,
    normalized_keys: Vec<String>,
    all_indices: Vec<usize>,
    /// Present for `Precompute` and `Ngram`; `LazyCache` goes through `lazy`.
    choseong_keys: Option<Arc<Vec<String>>>,
    ngram: Option<NgramIndex>,
    lazy: Arc<LazyKeys>,
    cache: Option<LruCache<String, Vec<usize>>>,
    policy: SearchPolicy,
    telemetry: Telemetry,
}

fn project_all(normalized_keys: &[String], options: &ChoseongOptions) -> Vec<String> {
    #[cfg(feature = "parallel")]
    {
        normalized_keys
            .par_iter()
            .map(|key| choseong(key, options))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        normalized_keys
            .iter()
            .map(|key| choseong(key, options))
            .collect()
    }
}

impl<T> SearchIndex<T> {
    /// Build an index over `items`, extracting each key once via `key_fn`.
    ///
    /// Construction is total: out-of-range policy values (n-gram size, LRU
    /// capacity) are clamped, never rejected.
    pub fn new<F>(items: Vec<T>, key_fn: F, policy: SearchPolicy) -> Self
    where
        F: Fn(&T) -> String,
    {
        let raw_keys: Vec<String> = items.iter().map(&key_fn).collect();
        let normalized_keys: Vec<String> = raw_keys
            .iter()
            .map(|key| normalized_search_token(key))
            .collect();
        let all_indices: Vec<usize> = (0..items.len()).collect();

        let (choseong_keys, ngram) = match policy.strategy {
            IndexStrategy::Precompute => {
                let keys = project_all(&normalized_keys, &policy.choseong);
                (Some(Arc::new(keys)), None)
            }
            IndexStrategy::Ngram(k) => {
                let k = k.clamp(2, 3);
                let keys = project_all(&normalized_keys, &policy.choseong);
                let ngram = NgramIndex::build(&keys, k);
                (Some(Arc::new(keys)), Some(ngram))
            }
            IndexStrategy::LazyCache => (None, None),
        };

        let cache = match policy.cache {
            CachePolicy::None => None,
            CachePolicy::Lru(capacity) => Some(LruCache::new(capacity)),
        };

        let lazy = Arc::new(LazyKeys::new());
        if matches!(policy.strategy, IndexStrategy::LazyCache)
            && matches!(policy.warmup, WarmupPolicy::Background)
        {
            let keys = normalized_keys.clone();
            let options = policy.choseong;
            LazyKeys::start_background_build(&lazy, move || project_all(&keys, &options));
        }

        Self {
            items,
            raw_keys,
            normalized_keys,
            all_indices,
            choseong_keys,
            ngram,
            lazy,
            cache,
            policy,
            telemetry: Telemetry::new(),
        }
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item at an index returned by a query.
    pub fn item(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// The raw key at an index.
    pub fn key(&self, index: usize) -> Option<&str> {
        self.raw_keys.get(index).map(String::as_str)
    }

    pub fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    /// Point-in-time copy of the operation counters.
    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    /// Zero the operation counters.
    pub fn reset_telemetry(&self) {
        self.telemetry.reset()
    }

    // -------------------------------------------------------------------------
    // Internals shared by the query pipeline and the ranking pipeline
    // -------------------------------------------------------------------------

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub(crate) fn cache(&self) -> Option<&LruCache<String, Vec<usize>>> {
        self.cache.as_ref()
    }

    pub(crate) fn normalized_keys(&self) -> &[String] {
        &self.normalized_keys
    }

    /// Normalize and truncate a raw query per policy. Projection happens
    /// separately because the ranking pipeline projects per variant.
    pub(crate) fn bound_query(&self, query: &str) -> String {
        let normalized = normalized_search_token(query);
        match self.policy.max_query_len {
            Some(max) if normalized.chars().count() > max => {
                normalized.chars().take(max).collect()
            }
            _ => normalized,
        }
    }

    /// Choseong projection under the index's options.
    pub(crate) fn project(&self, s: &str) -> String {
        choseong(s, &self.policy.choseong)
    }

    /// Base candidate indices for a projected query, before any scan cap.
    ///
    /// For the n-gram strategy this intersects posting lists (an empty
    /// result is a definitive miss); other strategies consider everything.
    pub(crate) fn base_candidates(&self, projected: &str) -> Vec<usize> {
        match &self.ngram {
            Some(ngram) => match ngram.candidates(projected) {
                Some(indices) => indices,
                None => self.all_indices.clone(),
            },
            None => self.all_indices.clone(),
        }
    }

    /// Apply the `max_candidate_scan` policy cap.
    pub(crate) fn cap_candidates(&self, mut candidates: Vec<usize>) -> Vec<usize> {
        if let Some(cap) = self.policy.max_candidate_scan {
            candidates.truncate(cap);
        }
        candidates
    }

    fn build_all_keys(&self) -> Vec<String> {
        project_all(&self.normalized_keys, &self.policy.choseong)
    }

    /// The full key vector if one exists without building: precomputed, or
    /// already materialized by someone else.
    pub(crate) fn shared_keys(&self) -> Option<Arc<Vec<String>>> {
        match &self.choseong_keys {
            Some(keys) => Some(Arc::clone(keys)),
            None => self.lazy.ready_keys(),
        }
    }

    /// Offer a fully built key vector to the materializer (no-op once ready).
    pub(crate) fn commit_lazy_keys(&self, keys: Vec<String>) {
        self.lazy.store_built_if_needed(keys);
    }

    #[cfg(test)]
    pub(crate) fn lazy_keys_ready(&self) -> bool {
        self.lazy.ready_keys().is_some()
    }

    /// The full choseong key vector, building it inline when lazy.
    pub(crate) fn resolve_keys(&self) -> Arc<Vec<String>> {
        match &self.choseong_keys {
            Some(keys) => Arc::clone(keys),
            None => self.lazy.get_or_build(|| self.build_all_keys()),
        }
    }

    /// As [`Self::resolve_keys`], polling for cancellation while building.
    ///
    /// A cancelled build commits nothing; a completed one commits through
    /// the materializer so later calls (and the sync path) reuse it.
    pub(crate) fn resolve_keys_cancellable(
        &self,
        token: &CancellationToken,
    ) -> Result<Arc<Vec<String>>, Cancelled> {
        if let Some(keys) = &self.choseong_keys {
            return Ok(Arc::clone(keys));
        }
        if let Some(keys) = self.lazy.ready_keys() {
            return Ok(keys);
        }
        let mut keys = Vec::with_capacity(self.normalized_keys.len());
        for (scanned, key) in self.normalized_keys.iter().enumerate() {
            if scanned % CANDIDATE_CHECKPOINT_INTERVAL == 0 {
                token.checkpoint()?;
            }
            keys.push(choseong(key, &self.policy.choseong));
        }
        self.lazy.store_built_if_needed(keys);
        // Read back through the materializer: someone else may have won the
        // store race, and every build is deterministic anyway.
        Ok(self
            .lazy
            .ready_keys()
            .unwrap_or_else(|| unreachable!("keys stored but not ready")))
    }

    /// Kick off the lazy background build explicitly (no-op for strategies
    /// that precompute, or if a build already ran).
    pub fn warm_up(&self) {
        if self.choseong_keys.is_none() {
            let keys = self.normalized_keys.clone();
            let options = self.policy.choseong;
            LazyKeys::start_background_build(&self.lazy, move || project_all(&keys, &options));
        }
    }
}
