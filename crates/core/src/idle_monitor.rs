// SPDX-License-Identifier: MIT

//! Process-wide "are all workers idle" signal shared across a worker pool.

use crate::clock::Clock;
use crate::worker_id::WorkerId;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Instant;

struct State {
    worker_count: usize,
    idle_workers: HashSet<WorkerId>,
    /// Wall-clock time the pool most recently became fully idle. Cleared the
    /// instant any worker goes busy.
    idle_since: Option<Instant>,
}

/// Shared across every worker in a pool; the only process-wide mutable state
/// besides the host signal subscription (see `ja-daemon`).
pub struct IdleMonitor {
    state: Mutex<State>,
}

impl IdleMonitor {
    pub fn new(worker_count: usize) -> Self {
        Self {
            state: Mutex::new(State {
                worker_count,
                idle_workers: HashSet::with_capacity(worker_count),
                idle_since: None,
            }),
        }
    }

    /// Mark `worker` idle (no job, last ping returned no work). Clock is
    /// passed explicitly so tests can control when "idle_since" starts.
    pub fn mark_idle(&self, worker: WorkerId, clock: &impl Clock) {
        let mut state = self.state.lock();
        state.idle_workers.insert(worker);
        if state.idle_workers.len() == state.worker_count && state.idle_since.is_none() {
            state.idle_since = Some(clock.now());
        }
    }

    /// Mark `worker` busy (picked up a job). Clears the pool-wide idle
    /// timestamp: a single busy worker means the pool is not "all idle".
    pub fn mark_busy(&self, worker: WorkerId) {
        let mut state = self.state.lock();
        state.idle_workers.remove(&worker);
        state.idle_since = None;
    }

    /// Returns the time the pool most recently became fully idle (`None` if
    /// not every worker is currently idle), and whether `all` workers are
    /// idle right now.
    pub fn idle(&self) -> (Option<Instant>, bool) {
        let state = self.state.lock();
        let all = state.worker_count > 0 && state.idle_workers.len() == state.worker_count;
        (state.idle_since, all)
    }

    /// True iff every worker in the pool has been continuously idle for at
    /// least `d`.
    pub fn idle_for_longer_than(&self, d: std::time::Duration, clock: &impl Clock) -> bool {
        match self.idle() {
            (Some(since), true) => clock.now().saturating_duration_since(since) >= d,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "idle_monitor_tests.rs"]
mod tests;
