// SPDX-License-Identifier: MIT

//! Scenario 6: the coordinator rejects the first few `UploadChunk` calls
//! with a transient (503-equivalent) error before accepting the rest.
//! Exercised against the real `ja_core::RetryPolicy`/`ja_wire::HttpRetryClassifier`
//! pair, the same ones `HttpCoordinator` drives its own retries with — only
//! the transport underneath is swapped for an in-memory counter.

use crate::support::{base_config, posix_script};
use async_trait::async_trait;
use ja_core::{FakeClock, Job, JobId, JobStatus, LogChunk, RetryClassifier, RetryPolicy};
use ja_engine::{JobCancelSignal, JobRunner};
use ja_wire::{Coordinator, CoordinatorError, HttpRetryClassifier, JobState, PingOutcome};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fails the first `flaky_attempts` upload attempts across the whole job
/// with a transient server error, then accepts everything after that.
struct FlakyUploadCoordinator {
    flaky_attempts: u32,
    attempts_so_far: AtomicU32,
    uploaded: Mutex<Vec<LogChunk>>,
}

impl FlakyUploadCoordinator {
    fn new(flaky_attempts: u32) -> Self {
        Self { flaky_attempts, attempts_so_far: AtomicU32::new(0), uploaded: Mutex::new(Vec::new()) }
    }

    fn transport_upload(&self, chunk: &LogChunk) -> Result<(), CoordinatorError> {
        let attempt = self.attempts_so_far.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.flaky_attempts {
            return Err(CoordinatorError::ServerError { status: 503, body: "try again".into() });
        }
        self.uploaded.lock().push(chunk.clone());
        Ok(())
    }
}

#[async_trait]
impl Coordinator for FlakyUploadCoordinator {
    async fn connect(&self, _agent_id: &str, _version: &str) -> Result<(), CoordinatorError> {
        Ok(())
    }
    async fn disconnect(&self) -> Result<(), CoordinatorError> {
        Ok(())
    }
    async fn heartbeat(&self) -> Result<(), CoordinatorError> {
        Ok(())
    }
    async fn ping(&self) -> Result<PingOutcome, CoordinatorError> {
        Ok(PingOutcome::Idle)
    }
    async fn accept_job(&self, job_id: &JobId) -> Result<Job, CoordinatorError> {
        Ok(Job::fixture(job_id.as_str()))
    }
    async fn start_job(&self, _job_id: &JobId, _started_at_ms: u64) -> Result<(), CoordinatorError> {
        Ok(())
    }
    async fn get_job_state(&self, _job_id: &JobId) -> Result<JobState, CoordinatorError> {
        Ok(JobState::Other)
    }

    // Mirrors HttpCoordinator::upload_chunk's own `run_with_policy` loop
    // (same policy shape, same classifier), but retries the in-memory
    // transport above instead of an HTTP call.
    async fn upload_chunk(&self, _job_id: &JobId, chunk: &LogChunk) -> Result<(), CoordinatorError> {
        let policy = RetryPolicy::forever_with_jitter(Duration::from_millis(1), Duration::from_millis(1));
        let classifier = HttpRetryClassifier;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.transport_upload(chunk) {
                Ok(()) => return Ok(()),
                Err(err) if classifier.is_retryable(&err) => {
                    if let Some(delay) = policy.delay_for(attempt, 0.0) {
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn save_header_times(
        &self,
        _job_id: &JobId,
        _times: BTreeMap<String, String>,
    ) -> Result<(), CoordinatorError> {
        Ok(())
    }
    async fn finish_job(&self, _job_id: &JobId, _status: &JobStatus) -> Result<(), CoordinatorError> {
        Ok(())
    }
}

#[tokio::test]
async fn chunks_survive_five_transient_upload_failures() {
    let tmp = tempfile::tempdir().unwrap();
    let bootstrap = posix_script(&tmp, "bootstrap.sh", "printf 'retry me please\\n'; exit 0");
    let coordinator = Arc::new(FlakyUploadCoordinator::new(5));
    let config = base_config(&tmp, bootstrap);
    let runner = JobRunner::new(coordinator.clone() as Arc<dyn Coordinator>, config, FakeClock::new());

    let job = Job::fixture("job-forever-retry");
    let status = runner.run(job, Arc::new(JobCancelSignal::new())).await.unwrap();

    assert_eq!(status.exit_status.as_deref(), Some("0"));
    assert_eq!(status.chunks_failed_count, 0, "a transient failure must not count as a lost chunk");

    let mut uploaded = coordinator.uploaded.lock().clone();
    uploaded.sort_by_key(|c| c.sequence);
    let reassembled: Vec<u8> = uploaded.iter().flat_map(|c| c.data.clone()).collect();
    assert_eq!(String::from_utf8(reassembled).unwrap(), "retry me please\n");
}
