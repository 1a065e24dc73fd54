// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the geomsaek command-line interface.
//!
//! Three subcommands: `search` for choseong matching against a word list,
//! `similar` for ranked typo-tolerant matching (optionally with the full
//! score trace), and `tune` to run the weight tuner over a feedback log and
//! print the leaderboard.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "geomsaek",
    about = "Choseong and similarity search over Korean word lists",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Contains,
    Prefix,
    Exact,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Precompute,
    Lazy,
    Ngram,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match a query's choseong projection against a word list
    Search {
        /// Word list file, one key per line
        wordlist: String,

        /// The query (choseong, full syllables, or mixed)
        query: String,

        /// Match mode
        #[arg(short, long, value_enum, default_value = "contains")]
        mode: ModeArg,

        /// Indexing strategy
        #[arg(short, long, value_enum, default_value = "precompute")]
        strategy: StrategyArg,

        /// Maximum number of results to display
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Rank typo-tolerant matches for a query
    Similar {
        /// Word list file, one key per line
        wordlist: String,

        /// The query
        query: String,

        /// Maximum number of results to return
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Drop results scoring below this total
        #[arg(long, default_value = "0.2")]
        min_score: f64,

        /// Disable Korean↔QWERTY query variants
        #[arg(long)]
        no_layout_variants: bool,

        /// Print the full score breakdown per hit
        #[arg(long)]
        explain: bool,
    },

    /// Tune similarity weights against a feedback log
    Tune {
        /// Word list file, one key per line
        wordlist: String,

        /// Feedback events as a JSON array
        feedback: String,

        /// Cap on weight vectors evaluated
        #[arg(long, default_value = "48")]
        max_candidates: usize,

        /// Minimum occurrences for a (query, key) pair to count
        #[arg(long, default_value = "2")]
        min_occurrences: u64,

        /// Write the tuned weights as JSON to this path
        #[arg(short, long)]
        out: Option<String>,
    },
}
