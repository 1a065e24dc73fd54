// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The candidate pipeline: variants → prefilter → score → top-K.
//!
//! A similar-search call fans out into query *variants* (the query itself,
//! plus its Korean↔QWERTY reinterpretations when enabled), and each variant
//! runs the same funnel:
//!
//! ```text
//! base candidates ──▶ prefilter (strong / coarse) ──▶ full scorer ──▶ best_scores
//!       │                    │                              │
//!   index lookup      cheap classification          gate + minimum_score
//! ```
//!
//! The *gate* is the reason this scales: after each variant it rises to the
//! k-th best total seen so far (k = limit) and never comes back down. Later
//! variants therefore skip candidates that cannot crack the current top-K —
//! both at the coarse stage (`coarse_cutoff = max(0.05, gate·0.6)`) and at
//! the survival check (`total ≥ gate`).
//!
//! Scoring fans out to rayon only when a variant has at least
//! [`PARALLEL_SCORE_THRESHOLD`] candidates per worker *and* no cancellation
//! token is in play; a cancellable call stays serial so its checkpoints
//! keep their cadence. Results are deterministic either way: within one
//! variant each index is scored at most once, so merge order cannot change
//! the outcome, and the final ordering ties break by index.

use crate::cancel::{
    Cancelled, CancellationToken, CANDIDATE_CHECKPOINT_INTERVAL, SCORING_CHECKPOINT_INTERVAL,
};
use crate::choseong::normalized_search_token;
use crate::index::SearchIndex;
use crate::layout::{hangul_to_qwerty, qwerty_to_hangul};
use crate::scoring::core::{coarse_similarity, explain, ScoreBreakdown, ScoreOptions};
use crate::types::{ExplainedSearchResult, ScoredSearchResult, SimilarityOptions};
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use parking_lot::Mutex;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Minimum candidates *per worker* before scoring goes parallel.
pub const PARALLEL_SCORE_THRESHOLD: usize = 256;

/// Floor for the coarse prefilter cutoff.
const COARSE_CUTOFF_FLOOR: f64 = 0.05;

/// The survivor set is trimmed back to `limit * TRIM_FACTOR` whenever it
/// outgrows `max(limit * TRIM_FACTOR, TRIM_MIN)`.
const TRIM_FACTOR: usize = 6;
const TRIM_MIN: usize = 256;

#[inline]
fn check(token: Option<&CancellationToken>) -> Result<(), Cancelled> {
    match token {
        Some(token) => token.checkpoint(),
        None => Ok(()),
    }
}

/// A classified candidate awaiting the full scorer.
#[derive(Clone, Copy)]
struct Candidate {
    index: usize,
    /// Structural match: the variant appears in the key or its projection.
    strong: bool,
    coarse: f64,
    /// Last-resort pick from an all-negative base; exempt from the coarse
    /// cutoff so the variant still gets a chance to score something.
    fallback: bool,
}

/// Everything one ranked entry needs to be reported or re-explained.
struct RankedEntry {
    index: usize,
    breakdown: ScoreBreakdown,
    variant_idx: usize,
}

struct RankOutput {
    entries: Vec<RankedEntry>,
    variants: Vec<String>,
    keys: Arc<Vec<String>>,
}

// =============================================================================
// PUBLIC ENTRY POINTS (crate-internal; the index wraps them with telemetry)
// =============================================================================

pub(crate) fn rank_similar<T>(
    index: &SearchIndex<T>,
    query: &str,
    opts: &SimilarityOptions,
) -> Vec<ScoredSearchResult> {
    match rank_core(index, query, opts, None) {
        Ok(output) => to_scored(index, output),
        // Without a token there is no cancellation source.
        Err(Cancelled) => Vec::new(),
    }
}

pub(crate) fn rank_similar_cancellable<T>(
    index: &SearchIndex<T>,
    query: &str,
    opts: &SimilarityOptions,
    token: &CancellationToken,
) -> Result<Vec<ScoredSearchResult>, Cancelled> {
    let output = rank_core(index, query, opts, Some(token))?;
    Ok(to_scored(index, output))
}

pub(crate) fn rank_explained<T>(
    index: &SearchIndex<T>,
    query: &str,
    opts: &SimilarityOptions,
) -> Vec<ExplainedSearchResult> {
    match rank_core(index, query, opts, None) {
        Ok(output) => to_explained(index, output, opts),
        Err(Cancelled) => Vec::new(),
    }
}

pub(crate) fn rank_explained_cancellable<T>(
    index: &SearchIndex<T>,
    query: &str,
    opts: &SimilarityOptions,
    token: &CancellationToken,
) -> Result<Vec<ExplainedSearchResult>, Cancelled> {
    let output = rank_core(index, query, opts, Some(token))?;
    Ok(to_explained(index, output, opts))
}

fn to_scored<T>(index: &SearchIndex<T>, output: RankOutput) -> Vec<ScoredSearchResult> {
    output
        .entries
        .into_iter()
        .map(|entry| ScoredSearchResult {
            index: entry.index,
            key: index.key(entry.index).unwrap_or_default().to_string(),
            score: entry.breakdown.total,
            breakdown: entry.breakdown,
            variant: output.variants[entry.variant_idx].clone(),
        })
        .collect()
}

/// Re-run the scorer for each winner to recover the full trace. The winners
/// are at most `limit` entries, so the recomputation is noise next to the
/// ranking pass itself.
fn to_explained<T>(
    index: &SearchIndex<T>,
    output: RankOutput,
    opts: &SimilarityOptions,
) -> Vec<ExplainedSearchResult> {
    let score_opts = ScoreOptions {
        ngram_size: opts.ngram_size.clamp(2, 3),
        weights: opts.weights.clamped(),
    };
    output
        .entries
        .into_iter()
        .map(|entry| {
            let variant = &output.variants[entry.variant_idx];
            let variant_choseong = index.project(variant);
            let target = &index.normalized_keys()[entry.index];
            let (breakdown, detail) = explain(
                variant,
                target,
                &variant_choseong,
                &output.keys[entry.index],
                &score_opts,
            );
            ExplainedSearchResult {
                index: entry.index,
                key: index.key(entry.index).unwrap_or_default().to_string(),
                score: breakdown.total,
                breakdown,
                detail,
                variant: variant.clone(),
            }
        })
        .collect()
}

// =============================================================================
// THE PIPELINE
// =============================================================================

fn rank_core<T>(
    index: &SearchIndex<T>,
    query: &str,
    opts: &SimilarityOptions,
    token: Option<&CancellationToken>,
) -> Result<RankOutput, Cancelled> {
    let limit = opts.limit.max(1);
    let score_opts = ScoreOptions {
        ngram_size: opts.ngram_size.clamp(2, 3),
        weights: opts.weights.clamped(),
    };

    check(token)?;
    let normalized = index.bound_query(query);
    check(token)?;

    if normalized.is_empty() {
        return Ok(RankOutput {
            entries: Vec::new(),
            variants: Vec::new(),
            keys: Arc::new(Vec::new()),
        });
    }

    // Variant generation: dedup, first-seen order.
    let mut variants = vec![normalized.clone()];
    if opts.include_layout_variants {
        for converted in [
            qwerty_to_hangul(&normalized),
            hangul_to_qwerty(&normalized),
        ] {
            let converted = normalized_search_token(&converted);
            if !converted.is_empty() && !variants.contains(&converted) {
                variants.push(converted);
            }
        }
    }

    // Key materialization; the cancellable path polls while it builds.
    let keys = match token {
        Some(token) => index.resolve_keys_cancellable(token)?,
        None => index.resolve_keys(),
    };

    let mut best: HashMap<usize, (ScoreBreakdown, usize)> = HashMap::new();
    let mut gate = opts.minimum_score;

    for (variant_idx, variant) in variants.iter().enumerate() {
        check(token)?;

        let variant_choseong = index.project(variant);
        let lookup = if variant_choseong.is_empty() {
            variant.as_str()
        } else {
            variant_choseong.as_str()
        };
        let base = index.base_candidates(lookup);
        if base.is_empty() {
            continue;
        }

        let target_count = base
            .len()
            .min(opts.candidate_limit_per_variant.max(limit * 10));

        let candidates = prefilter(
            index,
            &keys,
            variant,
            &variant_choseong,
            &base,
            target_count,
            limit,
            token,
        )?;

        let coarse_cutoff = (gate * 0.6).max(COARSE_CUTOFF_FLOOR);
        let survivors = score_candidates(
            index,
            &keys,
            variant,
            &variant_choseong,
            &candidates,
            &score_opts,
            opts.minimum_score,
            gate,
            coarse_cutoff,
            token,
        )?;

        // Keep the higher-scoring breakdown on collision; ties keep the
        // earlier variant.
        for (idx, breakdown) in survivors {
            match best.get(&idx) {
                Some((existing, _)) if existing.total >= breakdown.total => {}
                _ => {
                    best.insert(idx, (breakdown, variant_idx));
                }
            }
        }

        trim_and_raise_gate(&mut best, limit, &mut gate);
    }

    let mut entries: Vec<RankedEntry> = best
        .into_iter()
        .map(|(index, (breakdown, variant_idx))| RankedEntry {
            index,
            breakdown,
            variant_idx,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.breakdown
            .total
            .partial_cmp(&a.breakdown.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    entries.truncate(limit);

    Ok(RankOutput {
        entries,
        variants,
        keys,
    })
}

/// Classify the base set and cut it down to `target_count` when oversized.
///
/// Strong candidates (structural matches) come first, ordered by key length
/// then index; coarse candidates top up the remainder, ordered by coarse
/// score then index. An entirely negative base falls back to its first
/// `limit` entries so a variant never silently contributes nothing just
/// because the heuristics were pessimistic.
#[allow(clippy::too_many_arguments)]
fn prefilter<T>(
    index: &SearchIndex<T>,
    keys: &[String],
    variant: &str,
    variant_choseong: &str,
    base: &[usize],
    target_count: usize,
    limit: usize,
    token: Option<&CancellationToken>,
) -> Result<Vec<Candidate>, Cancelled> {
    let normalized_keys = index.normalized_keys();

    let mut classified = Vec::with_capacity(base.len());
    for (scanned, &idx) in base.iter().enumerate() {
        if scanned % CANDIDATE_CHECKPOINT_INTERVAL == 0 {
            check(token)?;
        }
        let raw_key = &normalized_keys[idx];
        let choseong_key = &keys[idx];
        let strong = raw_key.contains(variant)
            || (!variant_choseong.is_empty() && choseong_key.contains(variant_choseong));
        let coarse = if strong {
            0.0
        } else {
            coarse_similarity(variant, variant_choseong, raw_key, choseong_key)
        };
        classified.push(Candidate {
            index: idx,
            strong,
            coarse,
            fallback: false,
        });
    }

    if base.len() <= target_count {
        return Ok(classified);
    }

    let mut strong: Vec<Candidate> = classified.iter().copied().filter(|c| c.strong).collect();
    let mut coarse: Vec<Candidate> = classified
        .iter()
        .copied()
        .filter(|c| !c.strong && c.coarse > 0.0)
        .collect();

    if strong.is_empty() && coarse.is_empty() {
        return Ok(classified
            .into_iter()
            .take(limit)
            .map(|c| Candidate {
                fallback: true,
                ..c
            })
            .collect());
    }

    strong.sort_by_key(|c| {
        (
            normalized_keys[c.index].chars().count(),
            c.index,
        )
    });
    coarse.sort_by(|a, b| {
        b.coarse
            .partial_cmp(&a.coarse)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });

    let mut picked = strong;
    for candidate in coarse {
        if picked.len() >= target_count {
            break;
        }
        picked.push(candidate);
    }
    Ok(picked)
}

/// Run the full scorer over the candidates, keeping entries that clear both
/// the caller's minimum and the current gate.
#[allow(clippy::too_many_arguments)]
fn score_candidates<T>(
    index: &SearchIndex<T>,
    keys: &[String],
    variant: &str,
    variant_choseong: &str,
    candidates: &[Candidate],
    score_opts: &ScoreOptions,
    minimum_score: f64,
    gate: f64,
    coarse_cutoff: f64,
    token: Option<&CancellationToken>,
) -> Result<Vec<(usize, ScoreBreakdown)>, Cancelled> {
    let normalized_keys = index.normalized_keys();

    let score_one = |candidate: &Candidate| -> Option<(usize, ScoreBreakdown)> {
        if !candidate.strong && !candidate.fallback && candidate.coarse < coarse_cutoff {
            return None;
        }
        let target = &normalized_keys[candidate.index];
        let (breakdown, _) = explain(
            variant,
            target,
            variant_choseong,
            &keys[candidate.index],
            score_opts,
        );
        if breakdown.total >= minimum_score && breakdown.total >= gate {
            Some((candidate.index, breakdown))
        } else {
            None
        }
    };

    #[cfg(feature = "parallel")]
    if token.is_none() && candidates.len() >= PARALLEL_SCORE_THRESHOLD * rayon::current_num_threads()
    {
        let collector: Mutex<Vec<(usize, ScoreBreakdown)>> = Mutex::new(Vec::new());
        candidates
            .par_chunks(PARALLEL_SCORE_THRESHOLD)
            .for_each(|chunk| {
                let local: Vec<_> = chunk.iter().filter_map(|c| score_one(c)).collect();
                if !local.is_empty() {
                    collector.lock().extend(local);
                }
            });
        return Ok(collector.into_inner());
    }

    let mut survivors = Vec::new();
    for (scored, candidate) in candidates.iter().enumerate() {
        if scored % SCORING_CHECKPOINT_INTERVAL == 0 {
            check(token)?;
        }
        if let Some(hit) = score_one(candidate) {
            survivors.push(hit);
        }
    }
    Ok(survivors)
}

/// Trim the survivor set and raise the gate to the k-th best total.
///
/// Both the trim target and the threshold use the same `limit · 6` factor;
/// the gate never decreases across variants.
fn trim_and_raise_gate(
    best: &mut HashMap<usize, (ScoreBreakdown, usize)>,
    limit: usize,
    gate: &mut f64,
) {
    let trim_target = limit * TRIM_FACTOR;
    if best.len() > trim_target.max(TRIM_MIN) {
        let mut totals: Vec<(usize, f64)> = best
            .iter()
            .map(|(&idx, (breakdown, _))| (idx, breakdown.total))
            .collect();
        totals.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        let keep: std::collections::HashSet<usize> =
            totals.iter().take(trim_target).map(|&(idx, _)| idx).collect();
        best.retain(|idx, _| keep.contains(idx));
    }

    if best.len() >= limit {
        let mut totals: Vec<f64> = best.values().map(|(b, _)| b.total).collect();
        totals.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        *gate = gate.max(totals[limit - 1]);
    }
}
