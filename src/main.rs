// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Geomsaek CLI: search, rank, and tune over a word list.
//!
//! ```bash
//! # Choseong prefix search
//! geomsaek search words.txt "ㅍㄹ" --mode prefix
//!
//! # Typo-tolerant ranking with the score trace
//! geomsaek similar words.txt "검삭" --explain
//!
//! # Tune weights against a feedback log
//! geomsaek tune words.txt feedback.json --out weights.json
//! ```

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::process::ExitCode;
use std::time::Duration;

use geomsaek::{
    samples_from_events, tune, FeedbackEvent, IndexStrategy, MatchMode, SearchIndex, SearchPolicy,
    SimilarityOptions, SimilarityTuningOptions,
};

mod cli;
use cli::{Cli, Commands, ModeArg, StrategyArg};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Search {
            wordlist,
            query,
            mode,
            strategy,
            limit,
        } => run_search(&wordlist, &query, mode, strategy, limit),
        Commands::Similar {
            wordlist,
            query,
            limit,
            min_score,
            no_layout_variants,
            explain,
        } => run_similar(&wordlist, &query, limit, min_score, !no_layout_variants, explain),
        Commands::Tune {
            wordlist,
            feedback,
            max_candidates,
            min_occurrences,
            out,
        } => run_tune(&wordlist, &feedback, max_candidates, min_occurrences, out.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn load_wordlist(path: &str) -> Result<Vec<String>, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))?;
    let words: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return Err(format!("{path} contains no keys"));
    }
    Ok(words)
}

fn build_index(words: Vec<String>, strategy: StrategyArg) -> SearchIndex<String> {
    let strategy = match strategy {
        StrategyArg::Precompute => IndexStrategy::Precompute,
        StrategyArg::Lazy => IndexStrategy::LazyCache,
        StrategyArg::Ngram => IndexStrategy::Ngram(2),
    };
    SearchIndex::new(
        words,
        |word| word.clone(),
        SearchPolicy {
            strategy,
            ..Default::default()
        },
    )
}

fn run_search(
    wordlist: &str,
    query: &str,
    mode: ModeArg,
    strategy: StrategyArg,
    limit: usize,
) -> Result<(), String> {
    let index = build_index(load_wordlist(wordlist)?, strategy);
    let mode = match mode {
        ModeArg::Contains => MatchMode::Contains,
        ModeArg::Prefix => MatchMode::Prefix,
        ModeArg::Exact => MatchMode::Exact,
    };

    let hits = index.search(query, mode);
    if hits.is_empty() {
        println!("no matches for {query:?}");
        return Ok(());
    }
    for (rank, hit) in hits.iter().take(limit).enumerate() {
        println!("{:>3}. {hit}", rank + 1);
    }
    if hits.len() > limit {
        println!("     … and {} more", hits.len() - limit);
    }
    Ok(())
}

fn run_similar(
    wordlist: &str,
    query: &str,
    limit: usize,
    min_score: f64,
    include_layout_variants: bool,
    explain: bool,
) -> Result<(), String> {
    let index = build_index(load_wordlist(wordlist)?, StrategyArg::Precompute);
    let opts = SimilarityOptions {
        limit,
        minimum_score: min_score,
        include_layout_variants,
        ..Default::default()
    };

    if explain {
        let hits = index.explain_similar(query, &opts);
        if hits.is_empty() {
            println!("no matches for {query:?}");
            return Ok(());
        }
        for (rank, hit) in hits.iter().enumerate() {
            println!(
                "{:>3}. {}  total={:.3}  (via {:?})",
                rank + 1,
                hit.key,
                hit.score,
                hit.variant
            );
            let b = &hit.breakdown;
            println!(
                "     edit={:.3} jaccard={:.3} keyboard={:.3} jamo={:.3} prefix={:.2} exact={:.2}",
                b.edit_sim, b.jaccard_sim, b.keyboard_sim, b.jamo_sim, b.prefix_bonus,
                b.exact_bonus
            );
            let d = &hit.detail;
            println!(
                "     jamo: {} ↔ {}  (distance {})  keys: {} ↔ {}",
                d.query_jamo, d.target_jamo, d.jamo_distance, d.query_latin, d.target_latin
            );
        }
    } else {
        let hits = index.search_similar(query, &opts);
        if hits.is_empty() {
            println!("no matches for {query:?}");
            return Ok(());
        }
        for (rank, hit) in hits.iter().enumerate() {
            println!("{:>3}. {}  {:.3}", rank + 1, hit.key, hit.score);
        }
    }
    Ok(())
}

fn run_tune(
    wordlist: &str,
    feedback_path: &str,
    max_candidates: usize,
    min_occurrences: u64,
    out: Option<&str>,
) -> Result<(), String> {
    let index = build_index(load_wordlist(wordlist)?, StrategyArg::Precompute);

    let content = fs::read_to_string(feedback_path)
        .map_err(|e| format!("failed to read {feedback_path}: {e}"))?;
    let events: Vec<FeedbackEvent> = serde_json::from_str(&content)
        .map_err(|e| format!("invalid feedback log {feedback_path}: {e}"))?;

    let samples = samples_from_events(&events, min_occurrences, 500);
    if samples.is_empty() {
        return Err(format!(
            "no training samples from {} events (min occurrences: {min_occurrences})",
            events.len()
        ));
    }
    println!(
        "{} events → {} training samples",
        events.len(),
        samples.len()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("evaluating up to {max_candidates} weight vectors…"));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let opts = SimilarityTuningOptions {
        max_candidates,
        ..Default::default()
    };
    let outcome = tune(&index, &samples, &opts);
    spinner.finish_and_clear();

    println!(
        "baseline: top1={:.3} top3={:.3} mrr={:.3} hit={:.3}",
        outcome.baseline.top1, outcome.baseline.top3, outcome.baseline.mrr,
        outcome.baseline.hit_rate
    );
    println!(
        "best:     top1={:.3} top3={:.3} mrr={:.3} hit={:.3}",
        outcome.best_metrics.top1, outcome.best_metrics.top3, outcome.best_metrics.mrr,
        outcome.best_metrics.hit_rate
    );
    println!();
    println!("leaderboard:");
    for (rank, entry) in outcome.leaderboard.iter().enumerate() {
        let w = &entry.weights;
        println!(
            "{:>3}. objective={:.4}  edit={:.2} jaccard={:.2} keyboard={:.2} jamo={:.2} prefix={:.2} exact={:.2}",
            rank + 1,
            entry.objective,
            w.edit_distance,
            w.jaccard,
            w.keyboard,
            w.jamo,
            w.prefix,
            w.exact
        );
    }

    if let Some(path) = out {
        let json = serde_json::to_string_pretty(&outcome.best_weights)
            .map_err(|e| format!("failed to serialize weights: {e}"))?;
        fs::write(path, json).map_err(|e| format!("failed to write {path}: {e}"))?;
        println!("\ntuned weights written to {path}");
    }
    Ok(())
}
