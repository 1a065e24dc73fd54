// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Scoring and ranking: how similar results get their numbers.
//!
//! `core` is the pure per-pair scorer — strings in, breakdown out. `ranking`
//! is the pipeline that decides which pairs are worth scoring: query
//! variants, the strong/coarse prefilter, parallel fan-out, and the rising
//! score gate that prunes candidates which can no longer reach the top K.

pub mod core;
pub(crate) mod ranking;

pub use self::core::{
    coarse_similarity, explain, ScoreBreakdown, ScoreDetail, ScoreOptions, SimilarityWeights,
};
