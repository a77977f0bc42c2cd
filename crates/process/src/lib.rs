// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ja-process: spawn, signal, and reap a child process tree, optionally
//! under a pseudo-terminal, with signal delivery to the whole process
//! group on platforms that support it.

mod config;
mod error;
mod handle;
mod platform;
mod pty;
mod signal_forward;
mod supervisor;

pub use config::{InterruptSignal, ProcessConfig};
pub use error::ProcessError;
pub use handle::{Latch, ProcessHandle, WaitStatus};
pub use signal_forward::forward_host_signals;
pub use supervisor::Process;
