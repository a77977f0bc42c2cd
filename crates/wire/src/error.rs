// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("coordinator request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 4xx response other than 429: permanent, per the coordinator's retry
    /// classifier contract.
    #[error("coordinator rejected the request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// A 5xx response, or 429 (rate-limited): transient.
    #[error("coordinator returned a retryable error (HTTP {status}): {body}")]
    ServerError { status: u16, body: String },

    #[error("failed to decode coordinator response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CoordinatorError {
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status.is_server_error() || status.as_u16() == 429 {
            Self::ServerError { status: status.as_u16(), body }
        } else {
            Self::Rejected { status: status.as_u16(), body }
        }
    }
}
