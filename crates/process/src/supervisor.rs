// SPDX-License-Identifier: MIT

//! Spawn, signal, and reap one child process — optionally under a PTY —
//! in its own process group, and fan its combined stdout/stderr out as a
//! byte stream for the caller (the job runner) to tee into a scanner and a
//! log streamer.

use crate::config::{InterruptSignal, ProcessConfig};
use crate::error::ProcessError;
use crate::handle::{ProcessHandle, WaitStatus};
use crate::platform::{self, PreSpawn};
use crate::pty;
use parking_lot::Mutex;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::mpsc;

/// A spawned child under supervision. `interrupt`/`terminate` are buffered
/// if called before the child has actually started, and both are
/// idempotent — calling either twice sends at most one signal.
pub struct Process {
    handle: Arc<ProcessHandle>,
    pid: Arc<AtomicU32>,
    interrupted: Arc<AtomicBool>,
    terminated: Arc<AtomicBool>,
    interrupt_signal: InterruptSignal,
    pending_interrupt: Arc<AtomicBool>,
    pending_terminate: Arc<AtomicBool>,
    output_rx: Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>,
}

impl Process {
    /// Spawn `config`. Returns once the child has launched (or failed to);
    /// `handle().wait_done()` resolves once it has been fully reaped.
    pub async fn spawn(config: ProcessConfig) -> Result<Self, ProcessError> {
        let handle = Arc::new(ProcessHandle::new());
        let pid = Arc::new(AtomicU32::new(0));
        let interrupted = Arc::new(AtomicBool::new(false));
        let terminated = Arc::new(AtomicBool::new(false));
        let pending_interrupt = Arc::new(AtomicBool::new(false));
        let pending_terminate = Arc::new(AtomicBool::new(false));

        let output_rx = if config.pty {
            Self::spawn_pty(&config, &handle, &pid).await?
        } else {
            Self::spawn_piped(&config, &handle, &pid).await?
        };

        let process = Self {
            handle,
            pid,
            interrupted,
            terminated,
            interrupt_signal: config.interrupt_signal,
            pending_interrupt,
            pending_terminate,
            output_rx: Mutex::new(Some(output_rx)),
        };
        process.apply_pending_signals();
        Ok(process)
    }

    async fn spawn_piped(
        config: &ProcessConfig,
        handle: &Arc<ProcessHandle>,
        pid_slot: &Arc<AtomicU32>,
    ) -> Result<mpsc::UnboundedReceiver<Vec<u8>>, ProcessError> {
        let mut cmd = tokio::process::Command::new(&config.path);
        cmd.args(&config.args)
            .current_dir(&config.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (k, v) in &config.env {
            cmd.env(k, v);
        }
        cmd.prepare_for_group();

        let mut child = cmd.spawn().map_err(|e| ProcessError::Launch {
            path: config.path.display().to_string(),
            source: e,
        })?;

        let pid = child.id().unwrap_or(0);
        pid_slot.store(pid, Ordering::SeqCst);
        handle.mark_started();
        tracing::info!(pid, path = %config.path.display(), "process spawned");

        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(pump_piped_output(stdout, stderr, tx));

        let handle = handle.clone();
        tokio::spawn(async move {
            let status = match child.wait().await {
                Ok(status) => WaitStatus {
                    exit_code: status.code().unwrap_or(-1),
                    terminating_signal: terminating_signal_name(&status),
                },
                Err(e) => {
                    tracing::warn!(error = %e, "failed to wait on child process");
                    WaitStatus::launch_failed()
                }
            };
            tracing::info!(exit_code = status.exit_code, "process reaped");
            handle.mark_done(status);
        });

        Ok(rx)
    }

    async fn spawn_pty(
        config: &ProcessConfig,
        handle: &Arc<ProcessHandle>,
        pid_slot: &Arc<AtomicU32>,
    ) -> Result<mpsc::UnboundedReceiver<Vec<u8>>, ProcessError> {
        let config = config.clone();
        let pty_child = tokio::task::spawn_blocking(move || pty::spawn(&config))
            .await
            .map_err(|e| ProcessError::Pty(e.to_string()))??;

        pid_slot.store(pty_child.pid.unwrap_or(0), Ordering::SeqCst);
        handle.mark_started();

        let handle = handle.clone();
        let mut wait_rx = pty_child.wait_rx;
        tokio::spawn(async move {
            let status = wait_rx.await.unwrap_or_else(|_| WaitStatus::launch_failed());
            handle.mark_done(status);
        });

        Ok(pty_child.output_rx)
    }

    fn apply_pending_signals(&self) {
        if self.pending_terminate.swap(false, Ordering::SeqCst) {
            self.terminate();
        } else if self.pending_interrupt.swap(false, Ordering::SeqCst) {
            self.interrupt();
        }
    }

    /// Send `interrupt_signal` to the child's process group. Idempotent;
    /// buffered if the child has not started yet.
    pub fn interrupt(&self) {
        if !self.handle.is_started() {
            self.pending_interrupt.store(true, Ordering::SeqCst);
            return;
        }
        if self.interrupted.swap(true, Ordering::SeqCst) {
            return;
        }
        let pid = self.pid.load(Ordering::SeqCst);
        if pid == 0 {
            return;
        }
        if let Err(e) = platform::interrupt_group(pid, self.interrupt_signal) {
            tracing::warn!(pid, error = %e, "failed to interrupt process group");
        } else {
            tracing::info!(pid, signal = platform::signal_name(self.interrupt_signal), "interrupted process group");
        }
    }

    /// Forcibly kill the child's process group. Idempotent; buffered if the
    /// child has not started yet.
    pub fn terminate(&self) {
        if !self.handle.is_started() {
            self.pending_terminate.store(true, Ordering::SeqCst);
            return;
        }
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        let pid = self.pid.load(Ordering::SeqCst);
        if pid == 0 {
            return;
        }
        if let Err(e) = platform::terminate_group(pid) {
            tracing::warn!(pid, error = %e, "failed to terminate process group");
        } else {
            tracing::info!(pid, "terminated process group");
        }
    }

    pub fn handle(&self) -> Arc<ProcessHandle> {
        self.handle.clone()
    }

    /// Takes the combined stdout/stderr byte stream. Can only be taken once;
    /// returns `None` on a second call.
    pub fn take_output(&self) -> Option<mpsc::UnboundedReceiver<Vec<u8>>> {
        self.output_rx.lock().take()
    }
}

/// Merge stdout and stderr into one channel, matching the child contract's
/// "stdout and stderr are merged (same writer)".
async fn pump_piped_output(
    stdout: ChildStdout,
    stderr: ChildStderr,
    tx: mpsc::UnboundedSender<Vec<u8>>,
) {
    let mut stdout = BufReader::new(stdout);
    let mut stderr = BufReader::new(stderr);
    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut stdout_buf = [0u8; 8192];
    let mut stderr_buf = [0u8; 8192];

    while !stdout_done || !stderr_done {
        tokio::select! {
            res = stdout.read(&mut stdout_buf), if !stdout_done => {
                match res {
                    Ok(0) | Err(_) => stdout_done = true,
                    Ok(n) => { if tx.send(stdout_buf[..n].to_vec()).is_err() { return; } }
                }
            }
            res = stderr.read(&mut stderr_buf), if !stderr_done => {
                match res {
                    Ok(0) | Err(_) => stderr_done = true,
                    Ok(n) => { if tx.send(stderr_buf[..n].to_vec()).is_err() { return; } }
                }
            }
        }
    }
}

#[cfg(unix)]
fn terminating_signal_name(status: &std::process::ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|sig| match sig {
        1 => "SIGHUP".to_string(),
        2 => "SIGINT".to_string(),
        9 => "SIGKILL".to_string(),
        15 => "SIGTERM".to_string(),
        other => format!("signal {other}"),
    })
}

#[cfg(not(unix))]
fn terminating_signal_name(_status: &std::process::ExitStatus) -> Option<String> {
    None
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
