// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Per-operation counters and latency accumulators.
//!
//! Six operation kinds (sync and cancellable variants of search, similar,
//! and explain), each with success/cancelled/failure counts and a
//! nanosecond latency accumulator, plus cache hits and total returned items
//! across all operations. One mutex guards the lot; updates are a few adds,
//! so the lock is never held long enough to matter.
//!
//! Cancellation is not failure. The columns are separate because the two
//! mean different things operationally: failures page somebody, cancels are
//! the UI debouncing keystrokes.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;

/// The six instrumented operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    SearchSync,
    SearchCancellable,
    SimilarSync,
    SimilarCancellable,
    ExplainSync,
    ExplainCancellable,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::SearchSync,
        Operation::SearchCancellable,
        Operation::SimilarSync,
        Operation::SimilarCancellable,
        Operation::ExplainSync,
        Operation::ExplainCancellable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::SearchSync => "search",
            Operation::SearchCancellable => "search_cancellable",
            Operation::SimilarSync => "similar",
            Operation::SimilarCancellable => "similar_cancellable",
            Operation::ExplainSync => "explain",
            Operation::ExplainCancellable => "explain_cancellable",
        }
    }

    fn index(self) -> usize {
        match self {
            Operation::SearchSync => 0,
            Operation::SearchCancellable => 1,
            Operation::SimilarSync => 2,
            Operation::SimilarCancellable => 3,
            Operation::ExplainSync => 4,
            Operation::ExplainCancellable => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct KindCounters {
    success: u64,
    cancelled: u64,
    failure: u64,
    latency_ns: u64,
}

struct Inner {
    kinds: [KindCounters; 6],
    cache_hits: u64,
    returned_items: u64,
    started_at: DateTime<Utc>,
}

/// Aggregated view of one operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OperationStats {
    pub success: u64,
    pub cancelled: u64,
    pub failure: u64,
    /// Mean wall time per operation in milliseconds, over all outcomes.
    pub mean_latency_ms: f64,
}

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub started_at: DateTime<Utc>,
    pub cache_hit_count: u64,
    pub returned_item_count: u64,
    pub operations: Vec<(&'static str, OperationStats)>,
}

impl TelemetrySnapshot {
    /// Stats for one operation kind.
    pub fn operation(&self, op: Operation) -> OperationStats {
        self.operations[op.index()].1
    }
}

/// Thread-safe counter bundle owned by the search index.
pub struct Telemetry {
    inner: Mutex<Inner>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                kinds: [KindCounters::default(); 6],
                cache_hits: 0,
                returned_items: 0,
                started_at: Utc::now(),
            }),
        }
    }

    /// Record a completed operation and how many items it returned.
    pub fn record_success(&self, op: Operation, elapsed: Duration, returned: usize) {
        let mut inner = self.inner.lock();
        let k = &mut inner.kinds[op.index()];
        k.success += 1;
        k.latency_ns = k.latency_ns.saturating_add(elapsed.as_nanos() as u64);
        inner.returned_items += returned as u64;
    }

    /// Record an operation stopped by its cancellation token.
    pub fn record_cancelled(&self, op: Operation, elapsed: Duration) {
        let mut inner = self.inner.lock();
        let k = &mut inner.kinds[op.index()];
        k.cancelled += 1;
        k.latency_ns = k.latency_ns.saturating_add(elapsed.as_nanos() as u64);
    }

    /// Record an operation that surfaced an error.
    pub fn record_failure(&self, op: Operation, elapsed: Duration) {
        let mut inner = self.inner.lock();
        let k = &mut inner.kinds[op.index()];
        k.failure += 1;
        k.latency_ns = k.latency_ns.saturating_add(elapsed.as_nanos() as u64);
    }

    /// Record an LRU cache hit on the query path.
    pub fn record_cache_hit(&self) {
        self.inner.lock().cache_hits += 1;
    }

    /// Copy out all counters, computing mean latencies (ns → ms).
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let inner = self.inner.lock();
        let operations = Operation::ALL
            .iter()
            .map(|&op| {
                let k = inner.kinds[op.index()];
                let total = k.success + k.cancelled + k.failure;
                let mean_latency_ms = if total == 0 {
                    0.0
                } else {
                    (k.latency_ns as f64 / total as f64) / 1_000_000.0
                };
                (
                    op.name(),
                    OperationStats {
                        success: k.success,
                        cancelled: k.cancelled,
                        failure: k.failure,
                        mean_latency_ms,
                    },
                )
            })
            .collect();
        TelemetrySnapshot {
            started_at: inner.started_at,
            cache_hit_count: inner.cache_hits,
            returned_item_count: inner.returned_items,
            operations,
        }
    }

    /// Zero every counter and restart the observation window.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.kinds = [KindCounters::default(); 6];
        inner.cache_hits = 0;
        inner.returned_items = 0;
        inner.started_at = Utc::now();
    }
}
