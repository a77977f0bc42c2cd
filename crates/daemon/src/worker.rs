// SPDX-License-Identifier: MIT

//! Agent Worker: one instance of the acquire/run/stop loop — connect, spawn
//! a heartbeat task, ping for work, hand accepted jobs to a [`JobRunner`],
//! and disconnect on the way out.

use crate::error::WorkerError;
use ja_core::{Clock, IdleMonitor, JobId, SignalReason, WorkerId, WorkerIntervals, WorkerState};
use ja_engine::{JobCancelSignal, JobRunner, JobRunnerConfig};
use ja_wire::{Coordinator, PingOutcome};
use std::sync::Arc;
use std::time::Duration;

/// Poll cadence for forwarding a worker-level cancel escalation into a
/// currently running job's cancel signal.
const ESCALATION_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct AgentWorker<C: Clock> {
    id: WorkerId,
    coordinator: Arc<dyn Coordinator>,
    idle: Arc<IdleMonitor>,
    clock: C,
    agent_version: String,
    intervals: WorkerIntervals,
    disconnect_after_idle_timeout: Duration,
    runner_config: JobRunnerConfig,
}

impl<C: Clock> AgentWorker<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: WorkerId,
        coordinator: Arc<dyn Coordinator>,
        idle: Arc<IdleMonitor>,
        clock: C,
        agent_version: String,
        intervals: WorkerIntervals,
        disconnect_after_idle_timeout: Duration,
        runner_config: JobRunnerConfig,
    ) -> Self {
        Self { id, coordinator, idle, clock, agent_version, intervals, disconnect_after_idle_timeout, runner_config }
    }

    pub fn intervals(&self) -> WorkerIntervals {
        self.intervals
    }

    /// Run this worker's full lifecycle against `state`, which the pool
    /// owns and uses to request graceful stop / cancel escalation.
    pub async fn run(self, state: Arc<WorkerState>) -> Result<(), WorkerError> {
        self.coordinator
            .connect(self.id.as_str(), &self.agent_version)
            .await
            .map_err(WorkerError::Connect)?;

        let heartbeat_handle = {
            let coordinator = self.coordinator.clone();
            let id = self.id.clone();
            let interval = self.intervals.heartbeat_interval;
            tokio::spawn(async move { heartbeat_task(coordinator, id, interval).await })
        };

        self.ping_loop(&state).await;

        heartbeat_handle.abort();

        if let Err(err) = self.coordinator.disconnect().await {
            tracing::warn!(worker = %self.id, error = %err, "disconnect failed");
        }

        Ok(())
    }

    async fn ping_loop(&self, state: &Arc<WorkerState>) {
        loop {
            if state.is_stopped() {
                let (_, all_idle) = self.idle.idle();
                if all_idle {
                    tracing::info!(worker = %self.id, "idle at stop request, disconnecting immediately");
                }
                break;
            }

            tokio::time::sleep(jittered(self.intervals.ping_interval)).await;
            state.record_ping(self.clock.now());

            if state.is_stopped() {
                break;
            }

            match self.coordinator.ping().await {
                Ok(PingOutcome::Idle) => self.handle_idle(state),
                Ok(PingOutcome::AcceptJob(job_id)) => self.handle_job(job_id, state).await,
                Ok(PingOutcome::Disconnect) => {
                    tracing::info!(worker = %self.id, "coordinator requested disconnect");
                    break;
                }
                Err(err) => tracing::debug!(worker = %self.id, error = %err, "ping failed"),
            }
        }
    }

    fn handle_idle(&self, state: &Arc<WorkerState>) {
        self.idle.mark_idle(self.id.clone(), &self.clock);
        if self.idle.idle_for_longer_than(self.disconnect_after_idle_timeout, &self.clock) {
            tracing::info!(worker = %self.id, "pool idle beyond timeout, beginning graceful stop");
            state.request_stop();
        }
    }

    async fn handle_job(&self, job_id: String, state: &Arc<WorkerState>) {
        self.idle.mark_busy(self.id.clone());

        let job_id = JobId::from_string(job_id);
        let job = match self.coordinator.accept_job(&job_id).await {
            Ok(job) => job,
            Err(err) => {
                tracing::warn!(worker = %self.id, job_id = %job_id, error = %err, "accept-job failed");
                return;
            }
        };

        let cancel = Arc::new(JobCancelSignal::new());
        let watcher = {
            let state = state.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { forward_escalation(state, cancel).await })
        };

        let runner = JobRunner::new(self.coordinator.clone(), self.runner_config.clone(), self.clock.clone());
        if let Err(err) = runner.run(job, cancel).await {
            tracing::warn!(worker = %self.id, job_id = %job_id, error = %err, "job runner could not start the job");
        }

        watcher.abort();
    }
}

async fn heartbeat_task(coordinator: Arc<dyn Coordinator>, worker_id: WorkerId, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(err) = coordinator.heartbeat().await {
            tracing::warn!(worker = %worker_id, error = %err, "heartbeat failed");
        }
    }
}

/// Bridges a worker-level cancel escalation (second host interrupt) into the
/// running job's own cancel signal, so the job runner's cancel-enforcer task
/// doesn't need to know anything about host signals.
async fn forward_escalation(state: Arc<WorkerState>, cancel: Arc<JobCancelSignal>) {
    loop {
        if state.is_cancelled() {
            cancel.request(SignalReason::AgentStop);
            return;
        }
        if cancel.is_requested() {
            return;
        }
        tokio::time::sleep(ESCALATION_POLL_INTERVAL).await;
    }
}

fn jittered(base: Duration) -> Duration {
    let factor = 1.0 + (rand::random::<f64>() * 0.2 - 0.1);
    Duration::from_secs_f64((base.as_secs_f64() * factor).max(0.0))
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
