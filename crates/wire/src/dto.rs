// SPDX-License-Identifier: MIT

//! Request/response bodies for the coordinator's HTTP API.
//!
//! These are wire shapes only — `ja-wire` translates to/from [`ja_core`]
//! domain types at the edges so the rest of the workspace never touches
//! serde directly for coordinator traffic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct ConnectRequest<'a> {
    pub agent_id: &'a str,
    pub version: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PingAction {
    Idle,
    AcceptJob,
    Disconnect,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PingResponseBody {
    pub action: PingAction,
    #[serde(default)]
    pub job_id: Option<String>,
}

/// What a worker's ping loop does next, translated from [`PingResponseBody`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingOutcome {
    Idle,
    AcceptJob(String),
    Disconnect,
}

impl From<PingResponseBody> for PingOutcome {
    fn from(body: PingResponseBody) -> Self {
        match body.action {
            PingAction::Idle => Self::Idle,
            PingAction::Disconnect => Self::Disconnect,
            PingAction::AcceptJob => {
                Self::AcceptJob(body.job_id.unwrap_or_default())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Canceling,
    Canceled,
    #[serde(other)]
    Other,
}

impl JobState {
    pub fn is_cancel_requested(self) -> bool {
        matches!(self, Self::Canceling | Self::Canceled)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobStateResponse {
    pub state: JobState,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartJobRequest {
    pub id: String,
    pub started_at: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadChunkRequest {
    pub sequence: u64,
    pub offset: u64,
    pub size: u64,
    pub data: String,
}

impl From<&ja_core::LogChunk> for UploadChunkRequest {
    fn from(chunk: &ja_core::LogChunk) -> Self {
        use base64::Engine as _;
        Self {
            sequence: chunk.sequence,
            offset: chunk.offset,
            size: chunk.size,
            data: base64::engine::general_purpose::STANDARD.encode(&chunk.data),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveHeaderTimesRequest {
    pub times: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinishJobRequest {
    pub id: String,
    pub finished_at: u64,
    pub exit_status: Option<String>,
    pub signal: Option<String>,
    pub signal_reason: Option<String>,
    pub chunks_failed_count: u32,
}

impl FinishJobRequest {
    pub fn from_status(id: &str, status: &ja_core::JobStatus) -> Self {
        Self {
            id: id.to_string(),
            finished_at: status.finished_at_ms.unwrap_or_default(),
            exit_status: status.exit_status.clone(),
            signal: status.signal.clone(),
            signal_reason: status.signal_reason.map(|r| r.to_string()),
            chunks_failed_count: status.chunks_failed_count,
        }
    }
}
