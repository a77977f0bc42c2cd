// SPDX-License-Identifier: MIT

use crate::error::HookError;
use crate::template::{self, Shell};
use ja_core::{ChangedVar, HookEnvDiff};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

const INTERNAL_EXIT_STATUS_KEY: &str = "BUILDKITE_HOOK_EXIT_STATUS";
const INTERNAL_WORKING_DIR_KEY: &str = "BUILDKITE_HOOK_WORKING_DIR";
const POSIX_UNDERSCORE_KEY: &str = "_";
const POSIX_SHELLS: &[&str] = &["sh", "bash", "dash", "ksh", "zsh"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Unix,
    Windows,
}

impl TargetOs {
    pub fn host() -> Self {
        if cfg!(windows) {
            TargetOs::Windows
        } else {
            TargetOs::Unix
        }
    }
}

/// A materialized wrapper around a user hook script, capturing its
/// environment and working directory before and after it runs.
///
/// Owns a temp directory holding `wrapper-script`, `before-env`, and
/// `after-env`; the directory is removed on [`HookWrapper::close`] (or on
/// drop, if `close` was never called).
pub struct HookWrapper {
    dir: Mutex<Option<tempfile::TempDir>>,
    wrapper_script: PathBuf,
    before_env: PathBuf,
    after_env: PathBuf,
    hook_path: PathBuf,
}

impl HookWrapper {
    pub fn new(hook_path: &Path, os: TargetOs, agent_binary: &Path) -> Result<Self, HookError> {
        if let Some(interpreter) = read_shebang_interpreter(hook_path)? {
            if !POSIX_SHELLS.contains(&interpreter.as_str()) {
                return Err(HookError::UnsupportedShebang(interpreter));
            }
        }

        let shell = Shell::for_hook(os, hook_path);

        let dir = tempfile::Builder::new().prefix("ja-hook-").tempdir().map_err(HookError::TempDir)?;

        let wrapper_script = dir.path().join(shell.wrapper_file_name());
        let before_env = dir.path().join("before-env");
        let after_env = dir.path().join("after-env");

        let body = template::render(shell, hook_path, agent_binary, &before_env, &after_env);
        std::fs::write(&wrapper_script, body).map_err(HookError::Write)?;
        mark_executable(&wrapper_script)?;

        tracing::info!(
            hook = %hook_path.display(),
            wrapper = %wrapper_script.display(),
            "hook wrapper materialized"
        );

        Ok(Self {
            dir: Mutex::new(Some(dir)),
            wrapper_script,
            before_env,
            after_env,
            hook_path: hook_path.to_path_buf(),
        })
    }

    pub fn wrapper_script(&self) -> &Path {
        &self.wrapper_script
    }

    /// Diffs the before/after env dumps the wrapper script wrote while the
    /// hook ran. Call this only after the wrapper script has been executed
    /// to completion.
    pub fn changes(&self) -> Result<HookEnvDiff, HookError> {
        let before = read_env_file(&self.before_env)?;

        let after_raw = std::fs::read_to_string(&self.after_env).unwrap_or_default();
        if after_raw.trim().is_empty() {
            return Err(HookError::HookExited { hook: self.hook_path.clone() });
        }
        let after: BTreeMap<String, String> = serde_json::from_str(&after_raw).map_err(HookError::Decode)?;

        let mut diff = HookEnvDiff::default();
        for (key, value) in &after {
            match before.get(key) {
                None => {
                    diff.added.insert(key.clone(), value.clone());
                }
                Some(old) if old != value => {
                    diff.changed.insert(key.clone(), ChangedVar { old: old.clone(), new: value.clone() });
                }
                _ => {}
            }
        }
        for key in before.keys() {
            if !after.contains_key(key) {
                diff.removed.insert(key.clone());
            }
        }

        if let Some(dir) = after
            .get(INTERNAL_WORKING_DIR_KEY)
            .or_else(|| diff.changed.get(INTERNAL_WORKING_DIR_KEY).map(|c| &c.new))
        {
            diff.after_working_dir = PathBuf::from(dir);
        }

        for key in [INTERNAL_EXIT_STATUS_KEY, INTERNAL_WORKING_DIR_KEY, POSIX_UNDERSCORE_KEY] {
            diff.added.remove(key);
            diff.changed.remove(key);
            diff.removed.remove(key);
        }

        Ok(diff)
    }

    /// Removes the wrapper's temp directory. Safe to call more than once.
    pub fn close(&self) -> Result<(), HookError> {
        if let Some(dir) = self.dir.lock().take() {
            dir.close().map_err(HookError::Cleanup)?;
        }
        Ok(())
    }
}

fn read_shebang_interpreter(hook_path: &Path) -> Result<Option<String>, HookError> {
    let file = std::fs::File::open(hook_path).map_err(HookError::ReadHook)?;
    let mut first_line = String::new();
    std::io::BufReader::new(file).read_line(&mut first_line).map_err(HookError::ReadHook)?;

    let Some(rest) = first_line.trim_end().strip_prefix("#!") else {
        return Ok(None);
    };

    let mut tokens = rest.split_whitespace();
    let Some(first) = tokens.next() else { return Ok(None) };
    let basename = Path::new(first).file_name().and_then(|n| n.to_str()).unwrap_or(first);

    if basename == "env" {
        return Ok(tokens.next().map(str::to_string));
    }
    Ok(Some(basename.to_string()))
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), HookError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700)).map_err(HookError::Permissions)
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), HookError> {
    Ok(())
}

fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>, HookError> {
    match std::fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(raw) => serde_json::from_str(&raw).map_err(HookError::Decode),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(HookError::Read(e)),
    }
}

#[cfg(test)]
#[path = "wrapper_tests.rs"]
mod tests;
