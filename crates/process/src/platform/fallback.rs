// SPDX-License-Identifier: MIT

use crate::config::InterruptSignal;
use crate::error::ProcessError;

pub(crate) fn prepare_command_for_group(_cmd: &mut tokio::process::Command) {}

pub fn interrupt_group(_pid: u32, _signal: InterruptSignal) -> Result<(), ProcessError> {
    Err(ProcessError::Signal("process-group signaling is not supported on this platform".into()))
}

pub fn terminate_group(_pid: u32) -> Result<(), ProcessError> {
    Err(ProcessError::Signal("process-group signaling is not supported on this platform".into()))
}
