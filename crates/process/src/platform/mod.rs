// SPDX-License-Identifier: MIT

//! Platform-specific process-group formation and signal delivery.
//!
//! Three behaviors diverge by OS: process-group formation/kill semantics
//! (Unix signals the whole group; Windows signals only the direct child via
//! a Job Object), PTY availability (Unix only), and the hook wrapper
//! template (handled in `ja-hooks`, not here).

use crate::config::InterruptSignal;
use crate::error::ProcessError;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::*;

#[cfg(not(any(unix, windows)))]
mod fallback;
#[cfg(not(any(unix, windows)))]
pub use fallback::*;

/// Applied to a [`tokio::process::Command`] before spawning so the platform
/// can establish whatever process-tree isolation it supports.
pub trait PreSpawn {
    fn prepare_for_group(&mut self);
}

impl PreSpawn for tokio::process::Command {
    fn prepare_for_group(&mut self) {
        prepare_command_for_group(self);
    }
}

pub(crate) fn signal_name(signal: InterruptSignal) -> &'static str {
    match signal {
        InterruptSignal::Term => "SIGTERM",
        InterruptSignal::Int => "SIGINT",
        InterruptSignal::Hup => "SIGHUP",
        InterruptSignal::Usr1 => "SIGUSR1",
        InterruptSignal::Usr2 => "SIGUSR2",
    }
}
