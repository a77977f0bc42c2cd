// SPDX-License-Identifier: MIT

//! One-shot latches and the post-exit status a [`crate::Process`] publishes.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// A one-shot, idempotent event. Unlike a bare [`Notify`], `wait()` returns
/// immediately if the latch already fired before the caller started waiting
/// — required since `started`/`done` can fire before anyone observes them.
#[derive(Default)]
pub struct Latch {
    fired: AtomicBool,
    notify: Notify,
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub async fn wait(&self) {
        // Must construct the `Notified` future before re-checking `fired`,
        // otherwise a `fire()` landing between the check and the await is
        // missed (see tokio::sync::Notify's documented usage pattern).
        let notified = self.notify.notified();
        if self.is_fired() {
            return;
        }
        notified.await;
    }
}

/// The child's terminal status. `exit_code` is `-1` if the child could
/// never be launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitStatus {
    pub exit_code: i32,
    pub terminating_signal: Option<String>,
}

impl WaitStatus {
    pub fn launch_failed() -> Self {
        Self { exit_code: -1, terminating_signal: None }
    }
}

/// Observable state of one spawned child: one-shot `started`/`done` latches
/// plus the [`WaitStatus`] populated once `done` fires. Shared (via `Arc`)
/// between the task that owns the child and callers polling its lifecycle.
#[derive(Default)]
pub struct ProcessHandle {
    started: Latch,
    done: Latch,
    wait_status: Mutex<Option<WaitStatus>>,
}

impl ProcessHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mark_started(&self) {
        self.started.fire();
    }

    pub(crate) fn mark_done(&self, status: WaitStatus) {
        *self.wait_status.lock() = Some(status);
        self.done.fire();
    }

    pub fn is_started(&self) -> bool {
        self.started.is_fired()
    }

    pub fn is_done(&self) -> bool {
        self.done.is_fired()
    }

    pub async fn wait_started(&self) {
        self.started.wait().await
    }

    pub async fn wait_done(&self) {
        self.done.wait().await
    }

    pub fn wait_status(&self) -> Option<WaitStatus> {
        self.wait_status.lock().clone()
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
