// SPDX-License-Identifier: MIT

//! An in-memory [`Coordinator`] for exercising `ja-engine`/`ja-daemon`
//! without a network, scripted by pushing canned responses and reading back
//! recorded calls.

use crate::client::Coordinator;
use crate::dto::{JobState, PingOutcome};
use crate::error::CoordinatorError;
use async_trait::async_trait;
use ja_core::{Job, JobId, JobStatus, LogChunk};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum RecordedCall {
    Connect { agent_id: String },
    Disconnect,
    Heartbeat,
    Ping,
    AcceptJob { job_id: JobId },
    StartJob { job_id: JobId, started_at_ms: u64 },
    GetJobState { job_id: JobId },
    UploadChunk { job_id: JobId, chunk: LogChunk },
    SaveHeaderTimes { job_id: JobId, times: BTreeMap<String, String> },
    FinishJob { job_id: JobId, status: JobStatus },
}

struct State {
    calls: Vec<RecordedCall>,
    ping_script: VecDeque<Result<PingOutcome, CoordinatorError>>,
    job_state_script: VecDeque<Result<JobState, CoordinatorError>>,
    upload_chunk_script: VecDeque<Result<(), CoordinatorError>>,
    accept_job_job: Option<Job>,
}

/// Fake coordinator for tests. By default every call succeeds trivially;
/// use `script_*` to queue specific responses for the calls that branch on
/// them (`ping`, `get_job_state`, `upload_chunk`).
#[derive(Clone)]
pub struct FakeCoordinator {
    inner: Arc<Mutex<State>>,
}

impl Default for FakeCoordinator {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                ping_script: VecDeque::new(),
                job_state_script: VecDeque::new(),
                upload_chunk_script: VecDeque::new(),
                accept_job_job: None,
            })),
        }
    }
}

impl FakeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().calls.clone()
    }

    pub fn script_ping(&self, outcome: Result<PingOutcome, CoordinatorError>) {
        self.inner.lock().ping_script.push_back(outcome);
    }

    pub fn script_job_state(&self, state: Result<JobState, CoordinatorError>) {
        self.inner.lock().job_state_script.push_back(state);
    }

    pub fn script_upload_chunk(&self, result: Result<(), CoordinatorError>) {
        self.inner.lock().upload_chunk_script.push_back(result);
    }

    pub fn set_accept_job_job(&self, job: Job) {
        self.inner.lock().accept_job_job = Some(job);
    }
}

#[async_trait]
impl Coordinator for FakeCoordinator {
    async fn connect(&self, agent_id: &str, _version: &str) -> Result<(), CoordinatorError> {
        self.inner.lock().calls.push(RecordedCall::Connect { agent_id: agent_id.to_string() });
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), CoordinatorError> {
        self.inner.lock().calls.push(RecordedCall::Disconnect);
        Ok(())
    }

    async fn heartbeat(&self) -> Result<(), CoordinatorError> {
        self.inner.lock().calls.push(RecordedCall::Heartbeat);
        Ok(())
    }

    async fn ping(&self) -> Result<PingOutcome, CoordinatorError> {
        self.inner.lock().calls.push(RecordedCall::Ping);
        let mut inner = self.inner.lock();
        inner.ping_script.pop_front().unwrap_or(Ok(PingOutcome::Idle))
    }

    async fn accept_job(&self, job_id: &JobId) -> Result<Job, CoordinatorError> {
        self.inner.lock().calls.push(RecordedCall::AcceptJob { job_id: *job_id });
        let inner = self.inner.lock();
        Ok(inner.accept_job_job.clone().unwrap_or_else(|| Job::fixture(job_id.as_str())))
    }

    async fn start_job(&self, job_id: &JobId, started_at_ms: u64) -> Result<(), CoordinatorError> {
        self.inner.lock().calls.push(RecordedCall::StartJob { job_id: *job_id, started_at_ms });
        Ok(())
    }

    async fn get_job_state(&self, job_id: &JobId) -> Result<JobState, CoordinatorError> {
        self.inner.lock().calls.push(RecordedCall::GetJobState { job_id: *job_id });
        let mut inner = self.inner.lock();
        inner.job_state_script.pop_front().unwrap_or(Ok(JobState::Other))
    }

    async fn upload_chunk(&self, job_id: &JobId, chunk: &LogChunk) -> Result<(), CoordinatorError> {
        self.inner
            .lock()
            .calls
            .push(RecordedCall::UploadChunk { job_id: *job_id, chunk: chunk.clone() });
        let mut inner = self.inner.lock();
        inner.upload_chunk_script.pop_front().unwrap_or(Ok(()))
    }

    async fn save_header_times(
        &self,
        job_id: &JobId,
        times: BTreeMap<String, String>,
    ) -> Result<(), CoordinatorError> {
        self.inner.lock().calls.push(RecordedCall::SaveHeaderTimes { job_id: *job_id, times });
        Ok(())
    }

    async fn finish_job(&self, job_id: &JobId, status: &JobStatus) -> Result<(), CoordinatorError> {
        self.inner
            .lock()
            .calls
            .push(RecordedCall::FinishJob { job_id: *job_id, status: status.clone() });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
