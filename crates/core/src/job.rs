// SPDX-License-Identifier: MIT

//! Job identity and the data the coordinator hands the runner for one job.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Identifies one job instance across the coordinator and the runner.
    pub struct JobId("job-");
}

/// A job as received from the coordinator.
///
/// Immutable for the runner except through [`JobStatus`], which the runner
/// writes back as the job progresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Per-job override of the coordinator endpoint (rare; usually inherited
    /// from agent configuration).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Per-job access token, distinct from the agent's registration token.
    pub token: String,
    /// Environment variables the coordinator wants exported into the job.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Upper bound on the `Size` of any one [`crate::chunk::LogChunk`] produced for this job.
    pub chunks_max_size_bytes: u64,
    /// Pipeline step this job corresponds to. Only consumed by signature
    /// verification; opaque to the execution core.
    #[serde(default)]
    pub step: Option<String>,
    #[serde(default)]
    pub matrix_permutation: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    /// Fields the runner writes back and reports via `finish-job`.
    #[serde(default)]
    pub status: JobStatus,
}

impl Job {
    pub fn new(id: JobId, token: impl Into<String>, chunks_max_size_bytes: u64) -> Self {
        Self {
            id,
            endpoint: None,
            token: token.into(),
            env: HashMap::new(),
            chunks_max_size_bytes,
            step: None,
            matrix_permutation: None,
            signature: None,
            status: JobStatus::default(),
        }
    }
}

/// Why a job's process was sent an interrupt/terminate signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalReason {
    /// The coordinator reported the job as canceling/canceled.
    Cancel,
    /// The agent itself was asked to stop while this job was running.
    AgentStop,
    /// The process could not be launched at all.
    ProcessRunError,
}

crate::simple_display! {
    SignalReason {
        Cancel => "cancel",
        AgentStop => "agent_stop",
        ProcessRunError => "process_run_error",
    }
}

/// Terminal (and in-flight) bookkeeping the runner reports back to the
/// coordinator via `finish-job`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStatus {
    /// Epoch milliseconds when `start-job` was acknowledged.
    pub started_at_ms: Option<u64>,
    /// Epoch milliseconds when the process was fully reaped.
    pub finished_at_ms: Option<u64>,
    /// The child's exit code as a string (coordinator wire format), or `"-1"`
    /// if the process could not be launched.
    pub exit_status: Option<String>,
    /// Name of the signal that killed the child, if any.
    pub signal: Option<String>,
    pub signal_reason: Option<SignalReason>,
    pub chunks_failed_count: u32,
}

impl JobStatus {
    /// True once this job has reached a terminal status (exit code is known).
    pub fn is_terminal(&self) -> bool {
        self.exit_status.is_some()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Job {
    /// Build a job fixture for tests: `chunks_max_size_bytes` defaults to a
    /// generous value so tests that don't care about chunking don't have to
    /// think about it.
    pub fn fixture(id: impl Into<String>) -> Self {
        Self::new(JobId::from_string(id.into()), "test-token", 1024 * 1024)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
