// SPDX-License-Identifier: MIT

//! Builds the environment a job's process is launched with.
//!
//! Order matters: each step below overlays the previous one, and only step
//! 2's keys (the clean job env, before agent overrides) are what gets
//! written to `BUILDKITE_ENV_FILE`.

use std::collections::{BTreeMap, HashMap};
use std::io::Write as _;

/// Env keys the coordinator uses for agent registration. A job is not
/// allowed to set these itself; any attempt is stripped and recorded in
/// `BUILDKITE_IGNORED_ENV`.
const REGISTRATION_ONLY_KEYS: &[&str] = &["BUILDKITE_AGENT_REGISTRATION_TOKEN"];

const ENV_FILE_VAR: &str = "BUILDKITE_ENV_FILE";
const IGNORED_ENV_VAR: &str = "BUILDKITE_IGNORED_ENV";
const MESSAGE_VAR: &str = "BUILDKITE_MESSAGE";

/// A 64 KiB cap on any single exported value, inclusive of its `KEY=`
/// prefix and null terminator (as the child process sees it, C-string
/// style).
const MAX_ENV_VALUE_BYTES: usize = 64 * 1024;

/// Agent-side overrides applied after the job's own environment (step 4).
#[derive(Debug, Clone, Default)]
pub struct AgentOverrides {
    pub endpoint: String,
    pub access_token: String,
    pub agent_pid: u32,
    pub bin_path: String,
    pub build_path: String,
    pub hooks_path: Option<String>,
    pub plugins_path: Option<String>,
    pub run_in_pty: bool,
    pub command_eval: bool,
    pub git_submodules: bool,
    pub experiments: Vec<String>,
    pub redacted_vars: Vec<String>,
}

pub struct BuiltEnv {
    pub vars: HashMap<String, String>,
    /// Path to the materialized `BUILDKITE_ENV_FILE`. Caller owns cleanup.
    pub env_file_path: std::path::PathBuf,
}

/// Runs the full construction sequence (spec §4.E steps 1-7) and writes the
/// resulting `BUILDKITE_ENV_FILE` into `tmp_dir`.
pub fn build(
    os_env: impl IntoIterator<Item = (String, String)>,
    job_env: &HashMap<String, String>,
    overrides: &AgentOverrides,
    tmp_dir: &std::path::Path,
    env_file_suffix: &str,
) -> std::io::Result<BuiltEnv> {
    // 1. OS environment.
    let mut vars: HashMap<String, String> = os_env.into_iter().collect();

    // 2. Overlay Job.Env. This is the snapshot that gets written to the env file.
    vars.extend(job_env.iter().map(|(k, v)| (k.clone(), v.clone())));
    let clean_job_env = vars.clone();

    // 3. Strip registration-only keys, tracking what was removed.
    let mut ignored = Vec::new();
    for key in REGISTRATION_ONLY_KEYS {
        if vars.remove(*key).is_some() {
            ignored.push((*key).to_string());
        }
    }

    // 4. Agent-configuration overrides.
    vars.insert("BUILDKITE_AGENT_ENDPOINT".into(), overrides.endpoint.clone());
    vars.insert("BUILDKITE_AGENT_ACCESS_TOKEN".into(), overrides.access_token.clone());
    vars.insert("BUILDKITE_AGENT_PID".into(), overrides.agent_pid.to_string());
    vars.insert("BUILDKITE_BIN_PATH".into(), overrides.bin_path.clone());
    vars.insert("BUILDKITE_BUILD_PATH".into(), overrides.build_path.clone());
    if let Some(hooks) = &overrides.hooks_path {
        vars.insert("BUILDKITE_HOOKS_PATH".into(), hooks.clone());
    }
    if let Some(plugins) = &overrides.plugins_path {
        vars.insert("BUILDKITE_PLUGINS_PATH".into(), plugins.clone());
    }
    vars.insert("BUILDKITE_AGENT_RUN_IN_PTY".into(), bool_str(overrides.run_in_pty));
    vars.insert("BUILDKITE_COMMAND_EVAL".into(), bool_str(overrides.command_eval));
    vars.insert("BUILDKITE_GIT_SUBMODULES".into(), bool_str(overrides.git_submodules));
    if !overrides.experiments.is_empty() {
        vars.insert("BUILDKITE_AGENT_EXPERIMENT".into(), overrides.experiments.join(","));
    }
    if !overrides.redacted_vars.is_empty() {
        vars.insert("BUILDKITE_REDACTED_VARS".into(), overrides.redacted_vars.join(","));
    }

    // 5. Write the clean job env (step 2 snapshot) to a temp file.
    let env_file_path = tmp_dir.join(format!("job-env-{env_file_suffix}"));
    write_env_file(&env_file_path, &clean_job_env)?;
    vars.insert(ENV_FILE_VAR.into(), env_file_path.display().to_string());

    // 6. Expose the ignored keys.
    if !ignored.is_empty() {
        vars.insert(IGNORED_ENV_VAR.into(), ignored.join(","));
    }

    // 7. Truncate BUILDKITE_MESSAGE.
    if let Some(message) = vars.get(MESSAGE_VAR) {
        let truncated = truncate_message(message);
        if let Some(truncated) = truncated {
            vars.insert(MESSAGE_VAR.into(), truncated);
        }
    }

    Ok(BuiltEnv { vars, env_file_path })
}

fn bool_str(b: bool) -> String {
    if b { "true".to_string() } else { "false".to_string() }
}

fn write_env_file(path: &std::path::Path, vars: &HashMap<String, String>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    set_private_permissions(&file)?;
    let sorted: BTreeMap<&String, &String> = vars.iter().collect();
    for (key, value) in sorted {
        writeln!(file, "{key}=\"{value}\"", value = value.replace('"', "\\\""))?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_private_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn set_private_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

/// Truncates `value` so that `"BUILDKITE_MESSAGE=" + value + "\0"` fits in
/// [`MAX_ENV_VALUE_BYTES`], inclusive of the `KEY=` prefix and null
/// terminator. Returns `None` if no truncation is needed.
fn truncate_message(value: &str) -> Option<String> {
    let prefix_len = MESSAGE_VAR.len() + 1; // "KEY="
    let null_terminator_len = 1;
    let overhead = prefix_len + null_terminator_len;
    if value.len() + overhead <= MAX_ENV_VALUE_BYTES {
        return None;
    }

    let target_total = MAX_ENV_VALUE_BYTES - overhead;
    let original_len = value.len();
    let suffix = format!("[value truncated {original_len} -> {target_total} bytes]");
    let cut = target_total.saturating_sub(suffix.len());
    let cut = floor_char_boundary(value, cut);

    let mut truncated = String::with_capacity(target_total);
    truncated.push_str(&value[..cut]);
    truncated.push_str(&suffix);
    Some(truncated)
}

/// Largest byte index `<= index` that lies on a UTF-8 char boundary.
/// Stable-friendly stand-in for the nightly-only `str::floor_char_boundary`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
