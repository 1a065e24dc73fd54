// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The math behind similarity ranking.
//!
//! Four core signals, each in [0, 1], each catching a different way a query
//! can almost-match a key:
//!
//! | Signal         | Catches                                           |
//! |----------------|---------------------------------------------------|
//! | `edit_sim`     | plain typos at the syllable level                 |
//! | `jaccard_sim`  | shared choseong n-grams regardless of position    |
//! | `keyboard_sim` | finger slips — wrong key, right neighborhood      |
//! | `jamo_sim`     | typos *inside* a syllable (검삭 vs 검색 is one     |
//! |                | jamo off, but a whole syllable apart)             |
//!
//! The weighted mean of the four is the core score; exact and prefix bonuses
//! stack on top and the total clips to [0, 1]. Weights are data, not
//! constants — the tuner in `crate::tuning` exists to move them.
//!
//! Everything here is a pure function of its inputs. The ranking pipeline
//! decides *what* to score; this module only decides *how much* two strings
//! resemble each other.

use crate::choseong::normalized_search_token;
use crate::jamo::disassemble_atomic;
use crate::layout::{hangul_to_qwerty, substitution_cost};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Guard against a zero denominator in the weighted mean.
const MIN_CORE_WEIGHT_SUM: f64 = 1e-6;

/// Clamp range for the four core weights.
const CORE_WEIGHT_RANGE: (f64, f64) = (0.01, 2.0);

/// Clamp range for the two bonus weights.
const BONUS_WEIGHT_RANGE: (f64, f64) = (0.0, 0.5);

// =============================================================================
// WEIGHTS
// =============================================================================

/// The six tunable scoring weights.
///
/// Core weights live in [0.01, 2.0], bonuses in [0, 0.5]; [`Self::clamped`]
/// enforces the domains and every entry point that accepts caller weights
/// runs them through it first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimilarityWeights {
    pub edit_distance: f64,
    pub jaccard: f64,
    pub keyboard: f64,
    pub jamo: f64,
    pub prefix: f64,
    pub exact: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            edit_distance: 1.0,
            jaccard: 0.8,
            keyboard: 0.6,
            jamo: 1.0,
            prefix: 0.15,
            exact: 0.3,
        }
    }
}

impl SimilarityWeights {
    /// Copy with every weight forced into its domain.
    pub fn clamped(&self) -> Self {
        let core = |w: f64| w.clamp(CORE_WEIGHT_RANGE.0, CORE_WEIGHT_RANGE.1);
        let bonus = |w: f64| w.clamp(BONUS_WEIGHT_RANGE.0, BONUS_WEIGHT_RANGE.1);
        Self {
            edit_distance: core(self.edit_distance),
            jaccard: core(self.jaccard),
            keyboard: core(self.keyboard),
            jamo: core(self.jamo),
            prefix: bonus(self.prefix),
            exact: bonus(self.exact),
        }
    }

    /// Sum of the four core weights, floored away from zero.
    pub fn core_sum(&self) -> f64 {
        (self.edit_distance + self.jaccard + self.keyboard + self.jamo).max(MIN_CORE_WEIGHT_SUM)
    }

    /// Fixed-precision identity used by the tuner to deduplicate candidates.
    pub fn fingerprint(&self) -> String {
        format!(
            "{:.4}|{:.4}|{:.4}|{:.4}|{:.4}|{:.4}",
            self.edit_distance, self.jaccard, self.keyboard, self.jamo, self.prefix, self.exact
        )
    }
}

// =============================================================================
// SCORE SHAPES
// =============================================================================

/// Per-signal scores for one (query, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub edit_sim: f64,
    pub jaccard_sim: f64,
    pub keyboard_sim: f64,
    pub jamo_sim: f64,
    pub prefix_bonus: f64,
    pub exact_bonus: f64,
    /// Weighted mean of the four core signals.
    pub weighted_core: f64,
    /// `clip(weighted_core + exact_bonus + prefix_bonus, 0, 1)`.
    pub total: f64,
}

/// The intermediate strings and distances behind a breakdown, for `explain`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDetail {
    pub query: String,
    pub target: String,
    pub query_choseong: String,
    pub target_choseong: String,
    pub query_jamo: String,
    pub target_jamo: String,
    pub query_latin: String,
    pub target_latin: String,
    pub edit_distance: usize,
    pub jamo_distance: usize,
    pub keyboard_distance: f64,
    pub shared_ngrams: usize,
    pub total_ngrams: usize,
}

/// Knobs the scorer needs beyond the two strings.
#[derive(Debug, Clone, Copy)]
pub struct ScoreOptions {
    /// Gram size for the choseong Jaccard signal (clamped to 2..=3).
    pub ngram_size: usize,
    pub weights: SimilarityWeights,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            ngram_size: 2,
            weights: SimilarityWeights::default(),
        }
    }
}

// =============================================================================
// DISTANCES
// =============================================================================

/// Unit-cost Levenshtein over code-point slices.
pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut dp: Vec<usize> = (0..=b.len()).collect();
    for (i, &ac) in a.iter().enumerate() {
        let mut prev = dp[0];
        dp[0] = i + 1;
        for (j, &bc) in b.iter().enumerate() {
            let temp = dp[j + 1];
            let cost = usize::from(ac != bc);
            dp[j + 1] = (dp[j + 1] + 1).min(dp[j] + 1).min(prev + cost);
            prev = temp;
        }
    }
    dp[b.len()]
}

/// Levenshtein with keyboard-proximity substitution costs.
///
/// Insertions and deletions cost 1; substitutions cost per
/// [`crate::layout::substitution_cost`], so hitting a neighboring key is
/// cheaper than hitting one across the board.
pub fn keyboard_levenshtein(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() {
        return b.len() as f64;
    }
    if b.is_empty() {
        return a.len() as f64;
    }
    let mut dp: Vec<f64> = (0..=b.len()).map(|j| j as f64).collect();
    for (i, &ac) in a.iter().enumerate() {
        let mut prev = dp[0];
        dp[0] = (i + 1) as f64;
        for (j, &bc) in b.iter().enumerate() {
            let temp = dp[j + 1];
            let sub = prev + substitution_cost(ac, bc);
            dp[j + 1] = (dp[j + 1] + 1.0).min(dp[j] + 1.0).min(sub);
            prev = temp;
        }
    }
    dp[b.len()]
}

/// Character k-grams of a string.
fn ngrams(s: &str, k: usize) -> HashSet<String> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < k {
        return HashSet::new();
    }
    chars.windows(k).map(|w| w.iter().collect()).collect()
}

fn similarity_from_distance(distance: usize, max_len: usize) -> f64 {
    if max_len == 0 {
        1.0
    } else {
        1.0 - distance as f64 / max_len as f64
    }
}

// =============================================================================
// THE SCORER
// =============================================================================

/// Score one (query, target) pair, returning the breakdown and its trace.
///
/// The choseong projections are taken as arguments because the pipeline has
/// already computed them (the target's at index build time, the query's once
/// per variant); recomputing per candidate would dominate the profile.
pub fn explain(
    query: &str,
    target: &str,
    query_choseong: &str,
    target_choseong: &str,
    opts: &ScoreOptions,
) -> (ScoreBreakdown, ScoreDetail) {
    let weights = opts.weights.clamped();
    let k = opts.ngram_size.clamp(2, 3);

    let query = normalized_search_token(query);
    let target = normalized_search_token(target);
    let q_chars: Vec<char> = query.chars().collect();
    let t_chars: Vec<char> = target.chars().collect();

    // Edit similarity over whole code points.
    let edit_distance = levenshtein(&q_chars, &t_chars);
    let edit_sim = similarity_from_distance(edit_distance, q_chars.len().max(t_chars.len()));

    // Jaccard over choseong k-grams. A side too short to produce grams
    // degrades to string equality.
    let q_grams = ngrams(query_choseong, k);
    let t_grams = ngrams(target_choseong, k);
    let (jaccard_sim, shared_ngrams, total_ngrams) = if q_grams.is_empty() || t_grams.is_empty() {
        let eq = query_choseong == target_choseong;
        (if eq { 1.0 } else { 0.0 }, 0, 0)
    } else {
        let shared = q_grams.intersection(&t_grams).count();
        let union = q_grams.len() + t_grams.len() - shared;
        (shared as f64 / union as f64, shared, union)
    };

    // Keyboard similarity over the Latin projections, letters only.
    let latin = |s: &str| -> Vec<char> {
        hangul_to_qwerty(s)
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect()
    };
    let q_latin = latin(&query);
    let t_latin = latin(&target);
    let (keyboard_sim, keyboard_distance) = if q_latin.is_empty() && t_latin.is_empty() {
        (if query == target { 1.0 } else { 0.0 }, 0.0)
    } else {
        let d = keyboard_levenshtein(&q_latin, &t_latin);
        (1.0 - d / q_latin.len().max(t_latin.len()) as f64, d)
    };

    // Jamo similarity; falls back to the raw strings when either side has
    // no Hangul to decompose.
    let q_jamo = disassemble_atomic(&query);
    let t_jamo = disassemble_atomic(&target);
    let (jamo_distance, jamo_sim) = if q_jamo.is_empty() || t_jamo.is_empty() {
        let d = levenshtein(&q_chars, &t_chars);
        (d, similarity_from_distance(d, q_chars.len().max(t_chars.len())))
    } else {
        let d = levenshtein(&q_jamo, &t_jamo);
        (d, similarity_from_distance(d, q_jamo.len().max(t_jamo.len())))
    };

    let weighted_core = (edit_sim * weights.edit_distance
        + jaccard_sim * weights.jaccard
        + keyboard_sim * weights.keyboard
        + jamo_sim * weights.jamo)
        / weights.core_sum();

    let exact_bonus = if query == target { weights.exact } else { 0.0 };
    let prefix_bonus = if exact_bonus == 0.0
        && ((!query.is_empty() && target.starts_with(query.as_str()))
            || (!query_choseong.is_empty() && target_choseong.starts_with(query_choseong)))
    {
        weights.prefix
    } else {
        0.0
    };

    let total = (weighted_core + exact_bonus + prefix_bonus).clamp(0.0, 1.0);

    let breakdown = ScoreBreakdown {
        edit_sim,
        jaccard_sim,
        keyboard_sim,
        jamo_sim,
        prefix_bonus,
        exact_bonus,
        weighted_core,
        total,
    };
    let detail = ScoreDetail {
        query_jamo: q_jamo.iter().collect(),
        target_jamo: t_jamo.iter().collect(),
        query_latin: q_latin.iter().collect(),
        target_latin: t_latin.iter().collect(),
        query,
        target,
        query_choseong: query_choseong.to_string(),
        target_choseong: target_choseong.to_string(),
        edit_distance,
        jamo_distance,
        keyboard_distance,
        shared_ngrams,
        total_ngrams,
    };
    (breakdown, detail)
}

/// Cheap pre-scoring estimate used by the candidate prefilter.
///
/// Character-set Jaccard on the choseong strings (raw strings when either
/// projection is empty), a length-closeness term, and a small first-character
/// bonus. Zero overlap short-circuits to zero so the prefilter can drop the
/// candidate without further ceremony.
pub fn coarse_similarity(
    query: &str,
    query_choseong: &str,
    key: &str,
    key_choseong: &str,
) -> f64 {
    let (a, b) = if query_choseong.is_empty() || key_choseong.is_empty() {
        (query, key)
    } else {
        (query_choseong, key_choseong)
    };

    let a_set: HashSet<char> = a.chars().collect();
    let b_set: HashSet<char> = b.chars().collect();
    if a_set.is_empty() || b_set.is_empty() {
        return 0.0;
    }
    let shared = a_set.intersection(&b_set).count();
    if shared == 0 {
        return 0.0;
    }
    let union = a_set.len() + b_set.len() - shared;
    let overlap = shared as f64 / union as f64;

    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    let length_closeness = a_len.min(b_len) as f64 / a_len.max(b_len) as f64;

    let first_bonus = match (a.chars().next(), b.chars().next()) {
        (Some(x), Some(y)) if x == y => 0.1,
        _ => 0.0,
    };

    (0.65 * overlap + 0.35 * length_closeness + first_bonus).min(1.0)
}
