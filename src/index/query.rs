// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The query pipeline: exact / prefix / contains search, sync and
//! cancellable, plus the similarity entry points.
//!
//! Every operation here is total — an empty or oversize query yields an
//! empty result, never an error. The only way out early is the caller's own
//! cancellation token, and that surfaces as the [`Cancelled`] sentinel, not
//! a failure.
//!
//! The sync and cancellable paths share their shape deliberately: normalize
//! and project, consult the LRU, look up candidates, resolve the choseong
//! key source, filter, cache, map back to items in candidate order. The
//! cancellable variant adds checkpoints at each phase boundary and every 16
//! candidates, and — for the lazy strategy — materializes projections
//! progressively over just the candidate subset, committing to the shared
//! materializer only when that subset happened to cover the whole
//! collection. A cancelled call never commits a partial cache.

use super::SearchIndex;
use crate::cancel::{Cancelled, CancellationToken, CANDIDATE_CHECKPOINT_INTERVAL};
use crate::choseong::choseong;
use crate::scoring::ranking;
use crate::telemetry::Operation;
use crate::types::{ExplainedSearchResult, MatchMode, ScoredSearchResult, SimilarityOptions};
use std::sync::Arc;
use std::time::Instant;

/// Where filtered keys come from: the shared full vector, or a just-built
/// projection of the candidate subset (aligned with candidate positions).
enum KeySource {
    Shared(Arc<Vec<String>>),
    Subset(Vec<String>),
}

impl KeySource {
    #[inline]
    fn key(&self, position: usize, index: usize) -> &str {
        match self {
            KeySource::Shared(keys) => &keys[index],
            KeySource::Subset(keys) => &keys[position],
        }
    }
}

impl<T> SearchIndex<T> {
    // =========================================================================
    // CHOSEONG SEARCH
    // =========================================================================

    /// Match the query's choseong projection against the indexed keys.
    ///
    /// Results preserve candidate order (ascending item index).
    pub fn search(&self, query: &str, mode: MatchMode) -> Vec<&T> {
        let start = Instant::now();
        let indices = self.search_indices(query, mode);
        self.telemetry()
            .record_success(Operation::SearchSync, start.elapsed(), indices.len());
        self.collect_items(&indices)
    }

    /// As [`Self::search`], polling `token` at the documented checkpoints.
    pub fn search_cancellable(
        &self,
        query: &str,
        mode: MatchMode,
        token: &CancellationToken,
    ) -> Result<Vec<&T>, Cancelled> {
        let start = Instant::now();
        match self.search_indices_cancellable(query, mode, token) {
            Ok(indices) => {
                self.telemetry().record_success(
                    Operation::SearchCancellable,
                    start.elapsed(),
                    indices.len(),
                );
                Ok(self.collect_items(&indices))
            }
            Err(Cancelled) => {
                self.telemetry()
                    .record_cancelled(Operation::SearchCancellable, start.elapsed());
                Err(Cancelled)
            }
        }
    }

    /// Ranked typo-tolerant matches. See `crate::scoring::ranking` for the
    /// pipeline.
    pub fn search_similar(&self, query: &str, opts: &SimilarityOptions) -> Vec<ScoredSearchResult> {
        let start = Instant::now();
        let results = ranking::rank_similar(self, query, opts);
        self.telemetry()
            .record_success(Operation::SimilarSync, start.elapsed(), results.len());
        results
    }

    pub fn search_similar_cancellable(
        &self,
        query: &str,
        opts: &SimilarityOptions,
        token: &CancellationToken,
    ) -> Result<Vec<ScoredSearchResult>, Cancelled> {
        let start = Instant::now();
        match ranking::rank_similar_cancellable(self, query, opts, token) {
            Ok(results) => {
                self.telemetry().record_success(
                    Operation::SimilarCancellable,
                    start.elapsed(),
                    results.len(),
                );
                Ok(results)
            }
            Err(Cancelled) => {
                self.telemetry()
                    .record_cancelled(Operation::SimilarCancellable, start.elapsed());
                Err(Cancelled)
            }
        }
    }

    /// As [`Self::search_similar`], but each hit carries its full scoring
    /// trace.
    pub fn explain_similar(
        &self,
        query: &str,
        opts: &SimilarityOptions,
    ) -> Vec<ExplainedSearchResult> {
        let start = Instant::now();
        let results = ranking::rank_explained(self, query, opts);
        self.telemetry()
            .record_success(Operation::ExplainSync, start.elapsed(), results.len());
        results
    }

    pub fn explain_similar_cancellable(
        &self,
        query: &str,
        opts: &SimilarityOptions,
        token: &CancellationToken,
    ) -> Result<Vec<ExplainedSearchResult>, Cancelled> {
        let start = Instant::now();
        match ranking::rank_explained_cancellable(self, query, opts, token) {
            Ok(results) => {
                self.telemetry().record_success(
                    Operation::ExplainCancellable,
                    start.elapsed(),
                    results.len(),
                );
                Ok(results)
            }
            Err(Cancelled) => {
                self.telemetry()
                    .record_cancelled(Operation::ExplainCancellable, start.elapsed());
                Err(Cancelled)
            }
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn collect_items(&self, indices: &[usize]) -> Vec<&T> {
        indices.iter().filter_map(|&i| self.item(i)).collect()
    }

    fn search_indices(&self, query: &str, mode: MatchMode) -> Vec<usize> {
        let projected = self.project(&self.bound_query(query));
        if projected.is_empty() {
            return Vec::new();
        }

        let cache_key = format!("{}|{}", mode.tag(), projected);
        if let Some(cache) = self.cache() {
            if let Some(hit) = cache.get(&cache_key) {
                self.telemetry().record_cache_hit();
                return hit;
            }
        }

        let candidates = self.cap_candidates(self.base_candidates(&projected));
        let keys = self.resolve_keys();
        let matched: Vec<usize> = candidates
            .into_iter()
            .filter(|&idx| mode.matches(&keys[idx], &projected))
            .collect();

        if let Some(cache) = self.cache() {
            cache.insert(cache_key, matched.clone());
        }
        matched
    }

    fn search_indices_cancellable(
        &self,
        query: &str,
        mode: MatchMode,
        token: &CancellationToken,
    ) -> Result<Vec<usize>, Cancelled> {
        token.checkpoint()?;
        let projected = self.project(&self.bound_query(query));
        token.checkpoint()?;
        if projected.is_empty() {
            return Ok(Vec::new());
        }

        let cache_key = format!("{}|{}", mode.tag(), projected);
        if let Some(cache) = self.cache() {
            if let Some(hit) = cache.get(&cache_key) {
                self.telemetry().record_cache_hit();
                return Ok(hit);
            }
        }

        let candidates = self.cap_candidates(self.base_candidates(&projected));
        token.checkpoint()?;
        let keys = self.candidate_keys_cancellable(&candidates, token)?;

        let mut matched = Vec::new();
        for (position, &idx) in candidates.iter().enumerate() {
            if position % CANDIDATE_CHECKPOINT_INTERVAL == 0 {
                token.checkpoint()?;
            }
            if mode.matches(keys.key(position, idx), &projected) {
                matched.push(idx);
            }
        }

        // The scan ran to completion; only now is the result safe to cache.
        if let Some(cache) = self.cache() {
            cache.insert(cache_key, matched.clone());
        }
        Ok(matched)
    }

    /// Key source for a candidate subset on the cancellable path.
    ///
    /// Strategies that precompute (or have already materialized) serve the
    /// shared vector. Otherwise the subset is projected on the fly, with a
    /// checkpoint every 16 keys; if the subset turns out to be the whole
    /// collection, the vector is committed through the materializer so the
    /// work is never repeated.
    fn candidate_keys_cancellable(
        &self,
        candidates: &[usize],
        token: &CancellationToken,
    ) -> Result<KeySource, Cancelled> {
        if let Some(keys) = self.shared_keys() {
            return Ok(KeySource::Shared(keys));
        }

        let normalized = self.normalized_keys();
        let options = self.policy().choseong;
        let mut subset = Vec::with_capacity(candidates.len());
        for (scanned, &idx) in candidates.iter().enumerate() {
            if scanned % CANDIDATE_CHECKPOINT_INTERVAL == 0 {
                token.checkpoint()?;
            }
            subset.push(choseong(&normalized[idx], &options));
        }

        if candidates.len() == self.len() {
            // Candidates are ascending and distinct, so covering the whole
            // collection means the subset *is* the full aligned vector.
            self.commit_lazy_keys(subset.clone());
        }
        Ok(KeySource::Subset(subset))
    }
}
