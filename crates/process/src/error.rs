// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch {path}: {source}")]
    Launch { path: String, #[source] source: std::io::Error },

    #[error("failed to allocate a pseudo-terminal: {0}")]
    Pty(String),

    #[error("failed to signal the child process: {0}")]
    Signal(String),

    #[error("failed to wait on the child process: {0}")]
    Wait(String),
}
