// SPDX-License-Identifier: MIT

//! Windows has no process-group signal delivery; a Job Object is the closest
//! equivalent for "terminate the whole tree" (interrupt is not meaningfully
//! supported and only reaches the direct child, as documented upstream).

// WinAPI job-object/handle calls are unavoidably unsafe; scoped to this
// platform module rather than disabling the workspace-wide lint.
#![allow(unsafe_code)]

use crate::config::InterruptSignal;
use crate::error::ProcessError;
use windows::Win32::Foundation::CloseHandle;
use windows::Win32::System::JobObjects::{
    AssignProcessToJobObject, CreateJobObjectW, TerminateJobObject,
};
use windows::Win32::System::Threading::{OpenProcess, PROCESS_SET_QUOTA, PROCESS_TERMINATE};

pub(crate) fn prepare_command_for_group(_cmd: &mut tokio::process::Command) {
    // Job-object assignment happens after spawn, once the child's pid is
    // known; nothing to do pre-spawn on Windows.
}

/// Windows process groups don't support a graceful interrupt signal for an
/// arbitrary child; only `Terminate` is meaningfully implemented here.
pub fn interrupt_group(_pid: u32, _signal: InterruptSignal) -> Result<(), ProcessError> {
    Ok(())
}

pub fn terminate_group(pid: u32) -> Result<(), ProcessError> {
    // SAFETY: handles are opened, used, and closed within this function;
    // every path below closes every handle it opened.
    unsafe {
        let proc_handle = OpenProcess(PROCESS_TERMINATE | PROCESS_SET_QUOTA, false, pid)
            .map_err(|e| ProcessError::Signal(format!("OpenProcess({pid}) failed: {e}")))?;

        let job = CreateJobObjectW(None, None)
            .map_err(|e| ProcessError::Signal(format!("CreateJobObjectW failed: {e}")))?;

        if AssignProcessToJobObject(job, proc_handle).is_err() {
            // Already a member of another job object (nested jobs, common
            // under CI runners). Fall back to a direct terminate of just
            // this process; tree-wide cleanup on Windows is out of scope
            // here (see platform notes — only the direct child is signaled).
            let _ = CloseHandle(job);
            let result = windows::Win32::System::Threading::TerminateProcess(proc_handle, 1)
                .map_err(|e| ProcessError::Signal(format!("TerminateProcess({pid}) failed: {e}")));
            let _ = CloseHandle(proc_handle);
            return result;
        }

        let result = TerminateJobObject(job, 1)
            .map_err(|e| ProcessError::Signal(format!("TerminateJobObject failed: {e}")));
        let _ = CloseHandle(proc_handle);
        let _ = CloseHandle(job);
        result
    }
}
