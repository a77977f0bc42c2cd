// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Coordinator(#[from] ja_wire::CoordinatorError),

    #[error(transparent)]
    Process(#[from] ja_process::ProcessError),

    #[error(transparent)]
    Hook(#[from] ja_hooks::HookError),

    #[error("failed to write job env file")]
    EnvFile(#[source] std::io::Error),

    #[error("failed to open job log")]
    JobLog(#[source] std::io::Error),
}
