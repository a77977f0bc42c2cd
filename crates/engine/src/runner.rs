// SPDX-License-Identifier: MIT

//! Job Runner: orchestrates the Process Supervisor, Scanner, and Log
//! Streamer for a single job from `created` through `done`.

use crate::cancel::JobCancelSignal;
use crate::env::{self, AgentOverrides};
use crate::error::RunnerError;
use crate::job_logger::JobLogger;
use crate::scanner::Scanner;
use crate::streamer::LogStreamer;
use ja_core::{Clock, Job, JobId, JobStatus, LogChunk, SignalReason};
use ja_process::{forward_host_signals, InterruptSignal, Process, ProcessConfig};
use ja_wire::Coordinator;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Static, per-agent configuration a Job Runner needs in addition to the
/// job itself. Constructed once by the Agent Worker and shared (cloned)
/// across every job it runs.
#[derive(Clone)]
pub struct JobRunnerConfig {
    /// The executable every job is launched as (the real per-job command
    /// travels through `Job.Env`, mirroring the bootstrap/checkout script
    /// pattern described in spec §1 as an external black box).
    pub bootstrap_path: PathBuf,
    pub build_path: PathBuf,
    pub tmp_dir: PathBuf,
    pub agent_overrides: AgentOverrides,
    pub interrupt_signal: InterruptSignal,
    pub run_in_pty: bool,
    pub cancel_grace_period: Duration,
    pub job_status_interval: Duration,
    pub output_flush_interval: Duration,
    pub timestamp_lines: bool,
    pub upload_queue_capacity: usize,
    pub job_log_dir: Option<PathBuf>,
}

/// Number of header-time entries shipped per periodic flush.
const HEADER_BATCH_SIZE: usize = 50;

pub struct JobRunner<C: Clock> {
    coordinator: Arc<dyn Coordinator>,
    config: JobRunnerConfig,
    clock: C,
}

impl<C: Clock> JobRunner<C> {
    pub fn new(coordinator: Arc<dyn Coordinator>, config: JobRunnerConfig, clock: C) -> Self {
        Self { coordinator, config, clock }
    }

    /// Run `job` to completion, reporting `start-job`/`finish-job` along the
    /// way. Returns the final [`JobStatus`] (also what was reported to the
    /// coordinator), or an error if the job could not even be started.
    pub async fn run(&self, job: Job, external_cancel: Arc<JobCancelSignal>) -> Result<JobStatus, RunnerError> {
        let started_at_ms = self.clock.epoch_ms();
        self.coordinator.start_job(&job.id, started_at_ms).await?;

        let suffix = nanoid::nanoid!(8);
        let mut agent_overrides = self.config.agent_overrides.clone();
        agent_overrides.access_token = job.token.clone();
        let built_env = env::build(
            std::env::vars(),
            &job.env,
            &agent_overrides,
            &self.config.tmp_dir,
            &suffix,
        )
        .map_err(RunnerError::EnvFile)?;

        let mut process_config = ProcessConfig::new(&self.config.bootstrap_path, &self.config.build_path)
            .with_pty(self.config.run_in_pty);
        process_config.interrupt_signal = self.config.interrupt_signal;
        for (k, v) in &built_env.vars {
            process_config = process_config.env_var(k, v);
        }

        let status = match Process::spawn(process_config).await {
            Ok(process) => {
                self.run_started_process(&job, process, started_at_ms, external_cancel).await
            }
            Err(err) => {
                tracing::warn!(job_id = %job.id, error = %err, "failed to launch job process");
                JobStatus {
                    started_at_ms: Some(started_at_ms),
                    finished_at_ms: Some(self.clock.epoch_ms()),
                    exit_status: Some("-1".to_string()),
                    signal: None,
                    signal_reason: Some(SignalReason::ProcessRunError),
                    chunks_failed_count: 0,
                }
            }
        };

        let _ = tokio::fs::remove_file(&built_env.env_file_path).await;

        if let Err(err) = self.coordinator.finish_job(&job.id, &status).await {
            tracing::warn!(job_id = %job.id, error = %err, "coordinator rejected finish-job; giving up");
        }

        Ok(status)
    }

    async fn run_started_process(
        &self,
        job: &Job,
        process: Process,
        started_at_ms: u64,
        external_cancel: Arc<JobCancelSignal>,
    ) -> JobStatus {
        let process = Arc::new(process);
        let output_rx = process.take_output().expect("output taken exactly once per process");

        let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));
        let scanner = Arc::new(Mutex::new(Scanner::new(self.clock.clone(), self.config.timestamp_lines)));
        let job_logger = self.config.job_log_dir.clone().map(|dir| JobLogger::new(dir, &job.id));

        let tee_handle = {
            let buffer = buffer.clone();
            let scanner = scanner.clone();
            let job_logger = job_logger;
            tokio::spawn(tee_task(output_rx, buffer, scanner, job_logger))
        };

        let streamer = LogStreamer::start(self.coordinator.clone(), job.id, self.config.upload_queue_capacity);
        let streamer = Arc::new(tokio::sync::Mutex::new(Some(streamer)));

        let pump_handle = tokio::spawn(pump_task(
            buffer.clone(),
            scanner.clone(),
            streamer.clone(),
            process.clone(),
            self.coordinator.clone(),
            job.id,
            job.chunks_max_size_bytes,
            self.config.output_flush_interval,
        ));

        let poll_handle = tokio::spawn(poll_task(
            self.coordinator.clone(),
            job.id,
            process.clone(),
            external_cancel.clone(),
            self.config.job_status_interval,
        ));

        let enforcer_handle = tokio::spawn(enforce_cancel_task(
            process.clone(),
            external_cancel.clone(),
            self.config.cancel_grace_period,
        ));

        let signal_forward_handle = forward_host_signals(process.clone());

        process.handle().wait_done().await;

        let _ = tee_handle.await;
        let _ = pump_handle.await;
        let _ = poll_handle.await;
        let _ = enforcer_handle.await;
        let _ = signal_forward_handle.await;

        let streamer = streamer.lock().await.take().expect("streamer present until stop");
        let chunks_failed_count = streamer.failed_chunks();
        streamer.stop().await;

        let wait_status = process.handle().wait_status().unwrap_or_else(ja_process::WaitStatus::launch_failed);
        JobStatus {
            started_at_ms: Some(started_at_ms),
            finished_at_ms: Some(self.clock.epoch_ms()),
            exit_status: Some(wait_status.exit_code.to_string()),
            signal: wait_status.terminating_signal,
            signal_reason: external_cancel.reason(),
            chunks_failed_count,
        }
    }
}

async fn tee_task<C: Clock>(
    mut output_rx: tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>,
    buffer: Arc<Mutex<Vec<u8>>>,
    scanner: Arc<Mutex<Scanner<C>>>,
    job_logger: Option<JobLogger>,
) {
    while let Some(bytes) = output_rx.recv().await {
        let processed = scanner.lock().feed(&bytes);
        if let Some(logger) = &job_logger {
            logger.append(&processed).await;
        }
        buffer.lock().extend_from_slice(&processed);
    }
    let remainder = scanner.lock().finish();
    if !remainder.is_empty() {
        if let Some(logger) = &job_logger {
            logger.append(&remainder).await;
        }
        buffer.lock().extend_from_slice(&remainder);
    }
}

#[allow(clippy::too_many_arguments)]
async fn pump_task<C: Clock>(
    buffer: Arc<Mutex<Vec<u8>>>,
    scanner: Arc<Mutex<Scanner<C>>>,
    streamer: Arc<tokio::sync::Mutex<Option<LogStreamer>>>,
    process: Arc<Process>,
    coordinator: Arc<dyn Coordinator>,
    job_id: JobId,
    max_chunk_size: u64,
    flush_interval: Duration,
) {
    let mut cursor = ChunkCursor::default();
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                flush_once(&buffer, &scanner, &streamer, &coordinator, job_id, max_chunk_size, &mut cursor).await;
            }
            _ = process.handle().wait_done() => break,
        }
    }

    // Final drain: the tee task may still be writing after wait_done fires
    // (pipes close slightly before/around reap), so the caller joins this
    // task only after also joining the tee task, then expects one more
    // flush to pick up anything left.
    flush_once(&buffer, &scanner, &streamer, &coordinator, job_id, max_chunk_size, &mut cursor).await;
}

async fn flush_once<C: Clock>(
    buffer: &Arc<Mutex<Vec<u8>>>,
    scanner: &Arc<Mutex<Scanner<C>>>,
    streamer: &Arc<tokio::sync::Mutex<Option<LogStreamer>>>,
    coordinator: &Arc<dyn Coordinator>,
    job_id: JobId,
    max_chunk_size: u64,
    cursor: &mut ChunkCursor,
) {
    let new_bytes = {
        let mut buffer = buffer.lock();
        let taken = buffer[cursor.consumed as usize..].to_vec();
        cursor.consumed = buffer.len() as u64;
        taken
    };
    if !new_bytes.is_empty() {
        let chunks = cursor.split(&new_bytes, max_chunk_size.max(1));
        if let Some(streamer) = streamer.lock().await.as_ref() {
            for chunk in chunks {
                let _ = streamer.push(chunk).await;
            }
        }
    }

    let batch = scanner.lock().header_times_mut().take_batch(HEADER_BATCH_SIZE);
    if !batch.is_empty() {
        if let Err(err) = coordinator.save_header_times(&job_id, batch).await {
            tracing::warn!(job_id = %job_id, error = %err, "failed to upload header times");
        }
    }
}

/// Tracks both the byte cursor into the shared buffer and the
/// offset/sequence bookkeeping for chunk assignment.
#[derive(Default)]
struct ChunkCursor {
    consumed: u64,
    next_offset: u64,
    next_sequence: u64,
}

impl ChunkCursor {
    fn split(&mut self, bytes: &[u8], max_chunk_size: u64) -> Vec<LogChunk> {
        let max = max_chunk_size as usize;
        let mut chunks = Vec::new();
        for piece in bytes.chunks(max.max(1)) {
            let chunk = LogChunk::new(self.next_offset, self.next_sequence, piece.to_vec());
            self.next_offset = chunk.end_offset();
            self.next_sequence += 1;
            chunks.push(chunk);
        }
        chunks
    }
}

async fn poll_task(
    coordinator: Arc<dyn Coordinator>,
    job_id: JobId,
    process: Arc<Process>,
    cancel: Arc<JobCancelSignal>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if cancel.is_requested() {
                    break;
                }
                match coordinator.get_job_state(&job_id).await {
                    Ok(state) if state.is_cancel_requested() => {
                        cancel.request(SignalReason::Cancel);
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => tracing::debug!(job_id = %job_id, error = %err, "job-state poll failed"),
                }
            }
            _ = process.handle().wait_done() => break,
        }
    }
}

async fn enforce_cancel_task(process: Arc<Process>, cancel: Arc<JobCancelSignal>, grace_period: Duration) {
    tokio::select! {
        _ = cancel.wait() => {}
        _ = process.handle().wait_done() => return,
    }
    process.interrupt();
    tokio::select! {
        _ = tokio::time::sleep(grace_period) => process.terminate(),
        _ = process.handle().wait_done() => {}
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
