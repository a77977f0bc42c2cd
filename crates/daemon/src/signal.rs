// SPDX-License-Identifier: MIT

//! Host interrupt/termination signal waiting, shared by the pool's
//! graceful-stop-then-escalate shutdown sequence.

#[cfg(unix)]
pub async fn wait_for_interrupt() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn wait_for_interrupt() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
