// SPDX-License-Identifier: MIT

//! Forwards the host's own interrupt/termination signals to a running
//! child's process group for the child's lifetime. Used so that an
//! operator's Ctrl-C on the agent process itself reaches the job
//! immediately, independent of the coordinator's cancel-poll cadence.

use crate::supervisor::Process;
use std::sync::Arc;

#[cfg(unix)]
pub fn forward_host_signals(process: Arc<Process>) -> tokio::task::JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGINT forwarder");
                return;
            }
        };
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM forwarder");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sigint.recv() => process.interrupt(),
                _ = sigterm.recv() => process.interrupt(),
                _ = process.handle().wait_done() => return,
            }
        }
    })
}

#[cfg(not(unix))]
pub fn forward_host_signals(process: Arc<Process>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        process.handle().wait_done().await;
    })
}

#[cfg(all(test, unix))]
#[path = "signal_forward_tests.rs"]
mod tests;
