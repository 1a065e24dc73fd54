// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Click-through feedback: the raw material for weight tuning.
//!
//! Every time a user accepts a suggestion or clicks a result, the host
//! application records a [`FeedbackEvent`]. The store is an append-only ring
//! with two soft caps — a TTL and a maximum event count — both enforced
//! after every append, oldest entries first, with separate drop counters so
//! the summary can say *why* history went missing.
//!
//! Concurrency is deliberately boring: a `parking_lot::Mutex` serializes
//! mutators, and the read-side reports clone a consistent snapshot under
//! the same lock. Nothing in the store blocks beyond those few
//! microseconds, so an actor or channel would buy nothing here.
//!
//! [`FeedbackStore::training_samples`] is the bridge to the tuner: it
//! aggregates `(query, selected_key)` pairs — trimmed, normalized, counted,
//! stamped with recency — and keeps the pairs seen often enough to trust.

use crate::choseong::normalized_search_token;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// What the user did with the results of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackOutcome {
    AcceptedSuggestion,
    ClickedResult,
    NoSuggestion,
    Unknown,
}

/// One observed interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub query: String,
    pub selected_key: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub outcome: FeedbackOutcome,
    pub locale: Option<String>,
}

impl FeedbackEvent {
    /// Convenience constructor stamped with the current time.
    pub fn now(query: &str, selected_key: Option<&str>, outcome: FeedbackOutcome) -> Self {
        Self {
            query: query.to_string(),
            selected_key: selected_key.map(str::to_string),
            timestamp: Utc::now(),
            outcome,
            locale: None,
        }
    }
}

/// An aggregated `(query, expected_key)` pair ready for the tuner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSample {
    pub query: String,
    pub expected_key: String,
    pub count: u64,
    pub last_seen: DateTime<Utc>,
}

/// One row of the summary's top-pairs table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPair {
    pub query: String,
    pub selected_key: String,
    pub count: u64,
    pub last_seen: DateTime<Utc>,
}

/// Aggregate view of the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub generated_at: DateTime<Utc>,
    pub total_events: u64,
    pub unique_queries: u64,
    pub dropped_by_ttl: u64,
    pub dropped_by_capacity: u64,
    pub top_pairs: Vec<TopPair>,
}

/// How many pairs the summary reports.
const SUMMARY_TOP_PAIRS: usize = 10;

struct Inner {
    events: VecDeque<FeedbackEvent>,
    dropped_by_ttl: u64,
    dropped_by_capacity: u64,
}

/// Bounded, TTL'd event ring. All mutators serialize on one mutex.
pub struct FeedbackStore {
    inner: Mutex<Inner>,
    max_events: usize,
    ttl: Duration,
}

impl FeedbackStore {
    /// `max_events` is coerced to ≥ 1; `ttl` caps event age.
    pub fn new(max_events: usize, ttl: std::time::Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: VecDeque::new(),
                dropped_by_ttl: 0,
                dropped_by_capacity: 0,
            }),
            max_events: max_events.max(1),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(365)),
        }
    }

    /// Append one event, then enforce TTL and capacity.
    pub fn record(&self, event: FeedbackEvent) {
        self.record_at(event, Utc::now());
    }

    /// Append a batch in order, enforcing the caps once at the end.
    pub fn record_batch(&self, events: impl IntoIterator<Item = FeedbackEvent>) {
        let now = Utc::now();
        let mut inner = self.inner.lock();
        inner.events.extend(events);
        self.trim(&mut inner, now);
    }

    /// Append with an explicit clock — for replaying historical logs and
    /// for deterministic tests.
    pub fn record_at(&self, event: FeedbackEvent, now: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        inner.events.push_back(event);
        self.trim(&mut inner, now);
    }

    /// TTL first (counted separately), then capacity, both from the oldest
    /// end.
    fn trim(&self, inner: &mut Inner, now: DateTime<Utc>) {
        let horizon = now - self.ttl;
        while inner
            .events
            .front()
            .is_some_and(|e| e.timestamp < horizon)
        {
            inner.events.pop_front();
            inner.dropped_by_ttl += 1;
        }
        while inner.events.len() > self.max_events {
            inner.events.pop_front();
            inner.dropped_by_capacity += 1;
        }
    }

    /// Consistent copy of the retained events, oldest first.
    pub fn snapshot(&self) -> Vec<FeedbackEvent> {
        self.inner.lock().events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate `(query, selected_key)` pairs into training samples.
    ///
    /// Queries and keys are trimmed and normalized before counting; pairs
    /// below `min_occurrences` are dropped; the rest sort by count, then
    /// recency, then query, capped at `max_samples`.
    pub fn training_samples(&self, min_occurrences: u64, max_samples: usize) -> Vec<TrainingSample> {
        let events = self.snapshot();
        samples_from_events(&events, min_occurrences, max_samples)
    }

    /// Counts, drop totals, and the most frequent pairs.
    pub fn summary(&self) -> FeedbackSummary {
        let inner = self.inner.lock();
        let events: Vec<FeedbackEvent> = inner.events.iter().cloned().collect();
        let unique_queries = events
            .iter()
            .map(|e| normalized_search_token(e.query.trim()))
            .filter(|q| !q.is_empty())
            .collect::<std::collections::HashSet<_>>()
            .len() as u64;
        let top_pairs = samples_from_events(&events, 1, SUMMARY_TOP_PAIRS)
            .into_iter()
            .map(|s| TopPair {
                query: s.query,
                selected_key: s.expected_key,
                count: s.count,
                last_seen: s.last_seen,
            })
            .collect();
        FeedbackSummary {
            generated_at: Utc::now(),
            total_events: events.len() as u64,
            unique_queries,
            dropped_by_ttl: inner.dropped_by_ttl,
            dropped_by_capacity: inner.dropped_by_capacity,
            top_pairs,
        }
    }

    /// The summary as canonical JSON (sorted keys, ISO-8601 timestamps).
    pub fn summary_json(&self) -> String {
        let value = serde_json::to_value(self.summary())
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Aggregate raw events into training samples without a store.
///
/// Same trimming, normalization, filtering, and ordering as
/// [`FeedbackStore::training_samples`]; the nightly pipeline uses this to
/// consume event batches directly.
pub fn samples_from_events(
    events: &[FeedbackEvent],
    min_occurrences: u64,
    max_samples: usize,
) -> Vec<TrainingSample> {
    let mut pairs: HashMap<(String, String), (u64, DateTime<Utc>)> = HashMap::new();
    for event in events {
        let query = normalized_search_token(event.query.trim());
        let key = match &event.selected_key {
            Some(key) => key.trim().to_string(),
            None => continue,
        };
        if query.is_empty() || key.is_empty() {
            continue;
        }
        let entry = pairs
            .entry((query, key))
            .or_insert((0, event.timestamp));
        entry.0 += 1;
        if event.timestamp > entry.1 {
            entry.1 = event.timestamp;
        }
    }

    let mut samples: Vec<TrainingSample> = pairs
        .into_iter()
        .filter(|(_, (count, _))| *count >= min_occurrences.max(1))
        .map(|((query, expected_key), (count, last_seen))| TrainingSample {
            query,
            expected_key,
            count,
            last_seen,
        })
        .collect();
    samples.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(b.last_seen.cmp(&a.last_seen))
            .then(a.query.cmp(&b.query))
            .then(a.expected_key.cmp(&b.expected_key))
    });
    samples.truncate(max_samples);
    samples
}
