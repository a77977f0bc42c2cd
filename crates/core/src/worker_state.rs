// SPDX-License-Identifier: MIT

//! Mutex-guarded runtime state for a single agent worker.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

struct Inner {
    stopped: bool,
    cancelled: bool,
    disconnected: bool,
    last_ping: Option<Instant>,
}

/// Timing configuration for one worker's poll loops. Fixed for the worker's
/// lifetime; not guarded because it is never mutated after construction.
#[derive(Debug, Clone, Copy)]
pub struct WorkerIntervals {
    pub heartbeat_interval: Duration,
    pub ping_interval: Duration,
    pub job_status_interval: Duration,
}

/// Per-worker flags, guarded by a single mutex so `Cancel`/`Stop` from a
/// signal handler and reads from the ping loop never race.
pub struct WorkerState {
    inner: Mutex<Inner>,
    pub intervals: WorkerIntervals,
}

impl WorkerState {
    pub fn new(intervals: WorkerIntervals) -> Self {
        Self {
            inner: Mutex::new(Inner {
                stopped: false,
                cancelled: false,
                disconnected: false,
                last_ping: None,
            }),
            intervals,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.lock().stopped
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().cancelled
    }

    pub fn is_disconnected(&self) -> bool {
        self.inner.lock().disconnected
    }

    /// Request a graceful stop: finish the current job, accept no new ones.
    pub fn request_stop(&self) {
        self.inner.lock().stopped = true;
    }

    /// Escalate: the current job (if any) should be cancelled outright.
    /// Only meaningful once `request_stop` has already been called once.
    pub fn request_cancel(&self) {
        let mut inner = self.inner.lock();
        inner.stopped = true;
        inner.cancelled = true;
    }

    pub fn mark_disconnected(&self) {
        self.inner.lock().disconnected = true;
    }

    pub fn record_ping(&self, at: Instant) {
        self.inner.lock().last_ping = Some(at);
    }

    pub fn last_ping(&self) -> Option<Instant> {
        self.inner.lock().last_ping
    }
}

#[cfg(test)]
#[path = "worker_state_tests.rs"]
mod tests;
