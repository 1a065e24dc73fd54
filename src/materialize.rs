//! Lazy one-shot materialization of the choseong key vector.
//!
//! The `LazyCache` index strategy skips the projection pass at construction
//! and pays for it on first demand instead. This type is the coordination
//! point: three states (empty → building → ready), at most one build ever in
//! flight, and a condition variable that releases every waiter the moment
//! the keys land.
//!
//! The build is deterministic — every path computes the same vector — so
//! `store_built_if_needed` can be idempotent: whoever finishes first wins,
//! later completions are no-ops. That lets the cancellable search path
//! materialize keys progressively on its own and commit them opportunistically
//! when it happens to have covered the whole collection.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

enum State {
    Empty,
    Building,
    Ready(Arc<Vec<String>>),
}

/// One-shot lazily built key vector with a broadcast-on-ready barrier.
pub struct LazyKeys {
    state: Mutex<State>,
    ready: Condvar,
}

impl Default for LazyKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl LazyKeys {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Empty),
            ready: Condvar::new(),
        }
    }

    /// Kick off a background build if nothing has started one yet.
    ///
    /// No-op when a build is in flight or already finished. Takes the `Arc`
    /// explicitly because the worker thread needs its own handle.
    pub fn start_background_build<F>(this: &Arc<Self>, build: F)
    where
        F: FnOnce() -> Vec<String> + Send + 'static,
    {
        {
            let mut state = this.state.lock();
            match *state {
                State::Empty => *state = State::Building,
                State::Building | State::Ready(_) => return,
            }
        }
        let this = Arc::clone(this);
        std::thread::spawn(move || {
            let values = build();
            this.store_built_if_needed(values);
        });
    }

    /// The built keys, if the build has completed.
    pub fn ready_keys(&self) -> Option<Arc<Vec<String>>> {
        match &*self.state.lock() {
            State::Ready(values) => Some(Arc::clone(values)),
            _ => None,
        }
    }

    /// Return the keys, building them inline if nobody else has.
    ///
    /// If a build is in flight, blocks until the broadcast; spurious wakeups
    /// re-check the state.
    pub fn get_or_build<F>(&self, build: F) -> Arc<Vec<String>>
    where
        F: FnOnce() -> Vec<String>,
    {
        {
            let mut state = self.state.lock();
            loop {
                match &*state {
                    State::Ready(values) => return Arc::clone(values),
                    State::Building => self.ready.wait(&mut state),
                    State::Empty => {
                        *state = State::Building;
                        break;
                    }
                }
            }
        }
        // We own the build now; compute outside the lock so waiters can park.
        let values = build();
        self.store_built_if_needed(values);
        match &*self.state.lock() {
            State::Ready(values) => Arc::clone(values),
            _ => unreachable!("lazy build did not transition to ready"),
        }
    }

    /// Idempotently transition to ready and release all waiters.
    pub fn store_built_if_needed(&self, values: Vec<String>) {
        let mut state = self.state.lock();
        if !matches!(*state, State::Ready(_)) {
            *state = State::Ready(Arc::new(values));
            self.ready.notify_all();
        }
    }
}
