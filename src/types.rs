//! The building blocks of the search surface.
//!
//! These types define what callers hand the index (a policy, a query mode,
//! similarity options) and what they get back (scored results with their
//! breakdowns). The index itself lives in `crate::index`; nothing here holds
//! behavior beyond small total functions like [`MatchMode::matches`].
//!
//! # Invariants
//!
//! - `Ngram(k)` is always observed with `k ∈ {2, 3}` — construction clamps.
//! - `Lru(capacity)` is always observed with `capacity ≥ 1` — construction
//!   coerces.
//! - A `ScoredSearchResult.score` equals its `breakdown.total` and lies in
//!   [0, 1].

use crate::choseong::ChoseongOptions;
use crate::scoring::{ScoreBreakdown, ScoreDetail, SimilarityWeights};
use serde::Serialize;

// =============================================================================
// QUERY MODES
// =============================================================================

/// How a choseong-projected query is matched against a projected key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchMode {
    /// The key contains the query as a substring.
    Contains,
    /// The key starts with the query.
    Prefix,
    /// The key equals the query.
    Exact,
}

impl MatchMode {
    /// Apply the mode. Total: empty queries match everything, which the
    /// query pipeline rules out earlier by returning no results at all.
    pub fn matches(self, key: &str, query: &str) -> bool {
        match self {
            MatchMode::Contains => key.contains(query),
            MatchMode::Prefix => key.starts_with(query),
            MatchMode::Exact => key == query,
        }
    }

    /// Stable tag used in cache keys.
    pub fn tag(self) -> &'static str {
        match self {
            MatchMode::Contains => "contains",
            MatchMode::Prefix => "prefix",
            MatchMode::Exact => "exact",
        }
    }
}

// =============================================================================
// INDEX POLICY
// =============================================================================

/// Which derived structure backs candidate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStrategy {
    /// Project every key at construction time.
    Precompute,
    /// Defer projection to first demand (see `crate::materialize`).
    LazyCache,
    /// Precompute plus an inverted k-gram index over the projections.
    /// `k` is clamped to 2..=3 at construction.
    Ngram(usize),
}

/// Query-result caching policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    None,
    /// Bounded LRU; capacity is coerced to ≥ 1.
    Lru(usize),
}

/// Whether `LazyCache` starts its build in the background at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarmupPolicy {
    #[default]
    None,
    Background,
}

/// Everything the index needs to know at construction.
#[derive(Debug, Clone)]
pub struct SearchPolicy {
    pub choseong: ChoseongOptions,
    pub strategy: IndexStrategy,
    pub cache: CachePolicy,
    pub warmup: WarmupPolicy,
    /// Truncate queries to this many characters before projection.
    pub max_query_len: Option<usize>,
    /// Cap the candidate list scanned per query.
    pub max_candidate_scan: Option<usize>,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            choseong: ChoseongOptions::default(),
            strategy: IndexStrategy::Precompute,
            cache: CachePolicy::Lru(128),
            warmup: WarmupPolicy::None,
            max_query_len: None,
            max_candidate_scan: None,
        }
    }
}

// =============================================================================
// SIMILARITY OPTIONS & RESULTS
// =============================================================================

/// Knobs for `search_similar` / `explain_similar`.
#[derive(Debug, Clone)]
pub struct SimilarityOptions {
    /// Maximum results returned (coerced to ≥ 1).
    pub limit: usize,
    /// Gram size for the Jaccard signal and the n-gram lookup (2..=3).
    pub ngram_size: usize,
    /// Scoring budget per query variant; the effective cap is
    /// `max(candidate_limit_per_variant, limit · 10)`.
    pub candidate_limit_per_variant: usize,
    /// Also try the query under Korean↔QWERTY reinterpretation.
    pub include_layout_variants: bool,
    /// Results below this total are dropped.
    pub minimum_score: f64,
    pub weights: SimilarityWeights,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            ngram_size: 2,
            candidate_limit_per_variant: 320,
            include_layout_variants: true,
            minimum_score: 0.2,
            weights: SimilarityWeights::default(),
        }
    }
}

/// One ranked similarity hit.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredSearchResult {
    /// Position of the item in the indexed collection.
    pub index: usize,
    /// The item's raw key.
    pub key: String,
    /// Same as `breakdown.total`, surfaced for convenience.
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// The query variant that produced the winning score.
    pub variant: String,
}

/// A ranked hit with the full scoring trace.
#[derive(Debug, Clone, Serialize)]
pub struct ExplainedSearchResult {
    pub index: usize,
    pub key: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub detail: ScoreDetail,
    pub variant: String,
}
