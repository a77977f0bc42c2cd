// SPDX-License-Identifier: MIT

//! Worker pool: the top-level entry point spawns N [`AgentWorker`]s,
//! collects the first error into a channel of capacity N, and hands back a
//! [`WorkerPool`] handle (for `Stop(graceful)`) plus a [`WorkerPoolHandles`]
//! to join on. Remaining workers keep running in the background until
//! `Stop` is called — the caller decides when to tear the pool down.

use crate::error::WorkerError;
use crate::worker::AgentWorker;
use ja_core::{Clock, WorkerState};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Cheaply cloneable: holds only the per-worker state flags, so `stop` can
/// be called from anywhere a clone has been handed to, independent of the
/// join handles (which are consumed exactly once).
#[derive(Clone)]
pub struct WorkerPool {
    states: Vec<Arc<WorkerState>>,
}

impl WorkerPool {
    /// `graceful = true`: finish current jobs, accept no new ones.
    /// `graceful = false`: escalate — cancel whatever is currently running.
    pub fn stop(&self, graceful: bool) {
        for state in &self.states {
            if graceful {
                state.request_stop();
            } else {
                state.request_cancel();
            }
        }
    }
}

pub struct WorkerPoolHandles {
    handles: Vec<JoinHandle<Result<(), WorkerError>>>,
}

impl WorkerPoolHandles {
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

pub fn spawn_pool<C: Clock + 'static>(
    workers: Vec<AgentWorker<C>>,
) -> (WorkerPool, WorkerPoolHandles, mpsc::Receiver<String>) {
    let capacity = workers.len().max(1);
    let (tx, rx) = mpsc::channel(capacity);

    let mut states = Vec::with_capacity(workers.len());
    let mut handles = Vec::with_capacity(workers.len());

    for worker in workers {
        let state = Arc::new(WorkerState::new(worker.intervals()));
        let state_for_run = state.clone();
        let tx = tx.clone();
        let handle = tokio::spawn(async move {
            let result = worker.run(state_for_run).await;
            if let Err(err) = &result {
                let _ = tx.try_send(err.to_string());
            }
            result
        });
        states.push(state);
        handles.push(handle);
    }

    (WorkerPool { states }, WorkerPoolHandles { handles }, rx)
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
