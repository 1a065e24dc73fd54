//! Cooperative cancellation for the long-running query paths.
//!
//! There is no preemption here: cancellation is a flag the caller flips and
//! the query polls at fixed checkpoints — before and after normalization,
//! every [`CANDIDATE_CHECKPOINT_INTERVAL`] candidates scanned, every
//! [`SCORING_CHECKPOINT_INTERVAL`] entries scored, and before each query
//! variant. Between checkpoints the work is bounded and allocation-light,
//! so the worst-case response to `cancel()` is a few microseconds of extra
//! scanning.
//!
//! [`Cancelled`] is a sentinel, not an error: callers asked for the stop
//! they got. Telemetry records it in its own column, away from failures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Poll cadence while scanning candidate indices.
pub const CANDIDATE_CHECKPOINT_INTERVAL: usize = 16;

/// Poll cadence while scoring candidates.
pub const SCORING_CHECKPOINT_INTERVAL: usize = 32;

/// Out-of-band signal that a cancellable operation was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("operation cancelled")
    }
}

/// Shared flag a caller flips to stop an in-flight cancellable query.
///
/// Clones observe the same flag. Once cancelled, a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Bail out with the sentinel if cancellation was requested.
    #[inline]
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
