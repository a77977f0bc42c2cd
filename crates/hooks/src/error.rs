// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("unsupported shebang interpreter: {0}")]
    UnsupportedShebang(String),

    #[error("failed to read hook file")]
    ReadHook(#[source] std::io::Error),

    #[error("failed to create hook wrapper temp directory")]
    TempDir(#[source] std::io::Error),

    #[error("failed to write hook wrapper file")]
    Write(#[source] std::io::Error),

    #[error("failed to mark hook wrapper executable")]
    Permissions(#[source] std::io::Error),

    #[error("failed to read hook env dump")]
    Read(#[source] std::io::Error),

    #[error("failed to decode hook env dump")]
    Decode(#[source] serde_json::Error),

    #[error("hook '{hook}' exited before the wrapper could record its environment")]
    HookExited { hook: PathBuf },

    #[error("failed to remove hook wrapper temp directory")]
    Cleanup(#[source] std::io::Error),
}
