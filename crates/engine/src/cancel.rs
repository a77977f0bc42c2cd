// SPDX-License-Identifier: MIT

//! Unifies the two ways a running job can be told to stop: the cancel
//! poller observing `canceling`/`canceled` from the coordinator, and the
//! Agent Worker requesting a stop while this job is still running. Both
//! routes through the same `request()` so the interrupt/grace-period/
//! terminate sequence in the runner is written once.

use ja_core::SignalReason;
use ja_process::Latch;
use parking_lot::Mutex;

/// First writer wins: once a reason has been recorded, later calls to
/// `request` are no-ops, matching spec §4.E's `Cancel()` idempotence
/// requirement (at most one interrupt, at most one terminate).
#[derive(Default)]
pub struct JobCancelSignal {
    latch: Latch,
    reason: Mutex<Option<SignalReason>>,
}

impl JobCancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cancellation request. Returns `true` if this call is the
    /// one that set the reason (i.e. the first request).
    pub fn request(&self, reason: SignalReason) -> bool {
        let mut slot = self.reason.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(reason);
        drop(slot);
        self.latch.fire();
        true
    }

    pub fn is_requested(&self) -> bool {
        self.latch.is_fired()
    }

    pub fn reason(&self) -> Option<SignalReason> {
        *self.reason.lock()
    }

    /// Resolves once `request` has been called at least once (or
    /// immediately, if it already has).
    pub async fn wait(&self) {
        self.latch.wait().await
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
