// SPDX-License-Identifier: MIT

//! Unix process groups: the child is placed in its own group at spawn time
//! so `Interrupt`/`Terminate` reach the whole tree, not just the direct
//! child.

// `pre_exec` and direct `kill(2)` calls are unavoidably unsafe; scoped to
// this platform module rather than disabling the workspace-wide lint.
#![allow(unsafe_code)]

use crate::config::InterruptSignal;
use crate::error::ProcessError;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;

pub(crate) fn prepare_command_for_group(cmd: &mut tokio::process::Command) {
    // SAFETY: setpgid(0, 0) in the child between fork and exec only touches
    // the child's own process group; it is async-signal-safe and does not
    // allocate or touch shared state, satisfying pre_exec's requirements.
    unsafe {
        cmd.pre_exec(|| {
            nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
        });
    }
}

fn to_nix_signal(signal: InterruptSignal) -> Signal {
    match signal {
        InterruptSignal::Term => Signal::SIGTERM,
        InterruptSignal::Int => Signal::SIGINT,
        InterruptSignal::Hup => Signal::SIGHUP,
        InterruptSignal::Usr1 => Signal::SIGUSR1,
        InterruptSignal::Usr2 => Signal::SIGUSR2,
    }
}

fn killpg(pid: u32, signal: Signal) -> Result<(), ProcessError> {
    // Negative pid targets the whole process group (man 2 kill).
    let pgid = Pid::from_raw(-(pid as i32));
    match signal::kill(pgid, signal) {
        Ok(()) => Ok(()),
        // ESRCH: the group is already gone — the child beat us to exiting.
        Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(ProcessError::Signal(format!("kill({pid}, {signal}) failed: {e}"))),
    }
}

pub fn interrupt_group(pid: u32, signal: InterruptSignal) -> Result<(), ProcessError> {
    killpg(pid, to_nix_signal(signal))
}

pub fn terminate_group(pid: u32) -> Result<(), ProcessError> {
    killpg(pid, Signal::SIGKILL)
}
