// SPDX-License-Identifier: MIT

//! Pseudo-terminal child spawning via `portable-pty`.
//!
//! `portable-pty`'s reader/writer and child handle are all synchronous, so
//! both the blocking read loop and the blocking `wait()` run on
//! `spawn_blocking` and report back over channels the async supervisor can
//! await.

use crate::config::ProcessConfig;
use crate::error::ProcessError;
use crate::handle::WaitStatus;
use portable_pty::{native_pty_system, Child, CommandBuilder, PtySize};
use tokio::sync::{mpsc, oneshot};

pub struct PtyChild {
    pub output_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    pub wait_rx: oneshot::Receiver<WaitStatus>,
    pub pid: Option<u32>,
}

pub fn spawn(config: &ProcessConfig) -> Result<PtyChild, ProcessError> {
    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(PtySize { rows: 24, cols: 80, pixel_width: 0, pixel_height: 0 })
        .map_err(|e| ProcessError::Pty(e.to_string()))?;

    let mut cmd = CommandBuilder::new(&config.path);
    cmd.args(&config.args);
    cmd.cwd(&config.dir);
    for (k, v) in &config.env {
        cmd.env(k, v);
    }

    let mut child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|e| ProcessError::Launch { path: config.path.display().to_string(), source: std::io::Error::other(e) })?;
    // The slave side must be dropped in this process once the child owns it,
    // or reads from the master never see EOF.
    drop(pair.slave);

    let pid = child.process_id();
    let mut reader =
        pair.master.try_clone_reader().map_err(|e| ProcessError::Pty(e.to_string()))?;

    let (output_tx, output_rx) = mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || {
        use std::io::Read;
        let mut buf = [0u8; 8192];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if output_tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                // A closing PTY always raises an I/O error on the final
                // read; harmless, just stop.
                Err(_) => break,
            }
        }
    });

    let (wait_tx, wait_rx) = oneshot::channel();
    tokio::task::spawn_blocking(move || {
        let status = match child.wait() {
            Ok(status) => WaitStatus {
                exit_code: status.exit_code() as i32,
                terminating_signal: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to wait on pty child");
                WaitStatus::launch_failed()
            }
        };
        let _ = wait_tx.send(status);
    });

    Ok(PtyChild { output_rx, wait_rx, pid })
}
