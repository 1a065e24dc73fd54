//! In-memory fuzzy search for Korean (Hangul) text.
//!
//! Given a static collection of records with string keys, `geomsaek` answers
//! two kinds of queries: choseong (leading-consonant) substring/prefix/exact
//! matching, and ranked *similar* matching tolerant of typos, wrong-keyboard-
//! mode input, and jamo-level edits. A feedback subsystem retunes the
//! similarity weights offline under an A/B deployment policy.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐
//! │ jamo.rs  │──▶│choseong.rs│──▶│ index/   │──▶ search / search_similar
//! │ (codec)  │   │(projection│   │ (items,  │
//! └──────────┘   │ + normal- │   │ keys,    │   ┌────────────┐
//!       │        │ ization)  │   │ lookup)  │──▶│ scoring/   │
//!       ▼        └───────────┘   └──────────┘   │ (breakdown,│
//! ┌──────────┐   ┌───────────┐        │         │  ranking)  │
//! │compose.rs│◀──│ layout.rs │        ▼         └────────────┘
//! │(assembler│   │ (QWERTY↔  │   ┌──────────┐        │
//! └──────────┘   │  Hangul)  │   │telemetry │        ▼
//!                └───────────┘   └──────────┘   ┌────────────┐
//!                                               │ feedback / │
//!                                               │ tuning /   │
//!                                               │ deploy     │
//!                                               └────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use geomsaek::{MatchMode, SearchIndex, SearchPolicy, SimilarityOptions};
//!
//! let index = SearchIndex::new(
//!     vec!["프론트엔드", "백엔드", "데이터"],
//!     |item| item.to_string(),
//!     SearchPolicy::default(),
//! );
//!
//! // Two keystrokes into 프론트엔드:
//! let hits = index.search("ㅍㄹ", MatchMode::Prefix);
//! assert_eq!(hits, vec![&"프론트엔드"]);
//!
//! // Wrong keyboard mode, right intent:
//! let similar = index.search_similar("vmfhsxmdpsem", &SimilarityOptions::default());
//! assert_eq!(similar[0].key, "프론트엔드");
//! ```
//!
//! Queries never fail: empty input yields empty results, oversize input is
//! truncated, and the cancellable variants surface the [`Cancelled`]
//! sentinel rather than an error. The fallible surface is confined to the
//! deployment resolver/store, the nightly tuner, and the strict syllable
//! builder.

// Module declarations
pub mod cache;
pub mod cancel;
pub mod choseong;
pub mod compose;
pub mod deploy;
pub mod feedback;
pub mod index;
pub mod jamo;
pub mod layout;
pub mod materialize;
pub mod scoring;
pub mod telemetry;
pub mod tuning;
pub mod types;

#[doc(hidden)]
pub mod testing;

// Re-exports for the public API
pub use cache::LruCache;
pub use cancel::{Cancelled, CancellationToken};
pub use choseong::{choseong, normalized_search_token, ChoseongOptions, WhitespacePolicy};
pub use compose::{assemble, assemble_strict, Assembler, SyllableError};
pub use deploy::{
    bucket_for, resolve, resolve_or_default, AbPolicy, Bucket, DeployError, DeploymentConfig,
    EnvConfig, Environment, Resolution,
};
pub use feedback::{
    samples_from_events, FeedbackEvent, FeedbackOutcome, FeedbackStore, FeedbackSummary,
    TrainingSample,
};
pub use index::SearchIndex;
pub use jamo::{compose, decompose, disassemble, disassemble_atomic};
pub use layout::{hangul_to_qwerty, qwerty_to_hangul};
pub use materialize::LazyKeys;
pub use scoring::{
    coarse_similarity, explain, ScoreBreakdown, ScoreDetail, ScoreOptions, SimilarityWeights,
};
pub use telemetry::{Operation, OperationStats, TelemetrySnapshot};
pub use tuning::{
    evaluate, run_nightly, tune, NightlyOptions, NightlyOutcome, SimilarityTuningOptions,
    TuningError, TuningMetrics, TuningOutcome,
};
pub use types::{
    CachePolicy, ExplainedSearchResult, IndexStrategy, MatchMode, ScoredSearchResult,
    SearchPolicy, SimilarityOptions, WarmupPolicy,
};
