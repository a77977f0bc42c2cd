// SPDX-License-Identifier: MIT

//! Local raw-output mirror for a running job: a plain append-only copy of
//! everything the Scanner sees, kept next to the agent's own logs for
//! offline debugging. Not part of the coordinator-facing contract — a
//! failure here is logged and otherwise ignored.

use ja_core::JobId;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

pub struct JobLogger {
    path: PathBuf,
}

impl JobLogger {
    pub fn new(log_dir: impl AsRef<Path>, job_id: &JobId) -> Self {
        let path = log_dir.as_ref().join(format!("{}.log", job_id.as_str()));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append raw bytes. Failures are logged via `tracing` but never
    /// propagated: the mirror is a debugging aid, not part of the job's
    /// correctness contract.
    pub async fn append(&self, bytes: &[u8]) {
        if let Err(err) = self.write(bytes).await {
            tracing::warn!(job_log = %self.path.display(), error = %err, "failed to write job log mirror");
        }
    }

    async fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(bytes).await
    }
}

#[cfg(test)]
#[path = "job_logger_tests.rs"]
mod tests;
