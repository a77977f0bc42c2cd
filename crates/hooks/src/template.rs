// SPDX-License-Identifier: MIT

//! Per-platform wrapper script bodies. All three shapes do the same five
//! steps: dump env, source the hook, capture its exit status and working
//! directory, dump env again, exit with the saved status.

use crate::wrapper::TargetOs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Posix,
    Batch,
    PowerShell,
}

impl Shell {
    pub fn for_hook(os: TargetOs, hook_path: &Path) -> Self {
        match os {
            TargetOs::Unix => Shell::Posix,
            TargetOs::Windows => {
                let is_ps1 = hook_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("ps1"));
                if is_ps1 {
                    Shell::PowerShell
                } else {
                    Shell::Batch
                }
            }
        }
    }

    pub fn wrapper_file_name(self) -> &'static str {
        match self {
            Shell::Posix => "wrapper-script",
            Shell::Batch => "wrapper-script.bat",
            Shell::PowerShell => "wrapper-script.ps1",
        }
    }
}

pub fn render(shell: Shell, hook_path: &Path, agent_binary: &Path, before_env: &Path, after_env: &Path) -> String {
    let hook = hook_path.display();
    let agent = agent_binary.display();
    let before = before_env.display();
    let after = after_env.display();

    match shell {
        Shell::Posix => format!(
            "#!/bin/sh\n\
             \"{agent}\" env dump > \"{before}\"\n\
             . \"{hook}\"\n\
             BUILDKITE_HOOK_EXIT_STATUS=$?\n\
             BUILDKITE_HOOK_WORKING_DIR=\"$(pwd)\"\n\
             export BUILDKITE_HOOK_EXIT_STATUS BUILDKITE_HOOK_WORKING_DIR\n\
             \"{agent}\" env dump > \"{after}\"\n\
             exit \"$BUILDKITE_HOOK_EXIT_STATUS\"\n"
        ),
        Shell::Batch => format!(
            "@echo off\r\n\
             \"{agent}\" env dump > \"{before}\"\r\n\
             CALL \"{hook}\"\r\n\
             SET BUILDKITE_HOOK_EXIT_STATUS=%ERRORLEVEL%\r\n\
             SET BUILDKITE_HOOK_WORKING_DIR=%CD%\r\n\
             \"{agent}\" env dump > \"{after}\"\r\n\
             EXIT /B %BUILDKITE_HOOK_EXIT_STATUS%\r\n"
        ),
        Shell::PowerShell => format!(
            "& \"{agent}\" env dump > \"{before}\"\r\n\
             . \"{hook}\"\r\n\
             $env:BUILDKITE_HOOK_EXIT_STATUS = $LASTEXITCODE\r\n\
             $env:BUILDKITE_HOOK_WORKING_DIR = (Get-Location).Path\r\n\
             & \"{agent}\" env dump > \"{after}\"\r\n\
             exit $env:BUILDKITE_HOOK_EXIT_STATUS\r\n"
        ),
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
