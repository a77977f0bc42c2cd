// SPDX-License-Identifier: MIT

//! `WorkerConfig` assembly: built-in defaults, overridden by an optional TOML
//! file, then environment variables, then `clap`-derived CLI flags — in that
//! override order, matching the ambient-config chain the rest of the
//! workspace's tooling already uses (`oj-core`'s TOML config, `oj`'s CLI
//! flags, and the daemon's own `OJ_*` environment variables).

use crate::error::ConfigError;
use clap::Parser;
use ja_process::InterruptSignal;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub endpoint: String,
    pub token: String,
    pub worker_count: usize,
    pub agent_version: String,

    pub heartbeat_interval: Duration,
    pub ping_interval: Duration,
    pub job_status_interval: Duration,
    pub disconnect_after_idle_timeout: Duration,
    pub cancel_grace_period: Duration,
    pub output_flush_interval: Duration,

    pub bootstrap_path: PathBuf,
    pub build_path: PathBuf,
    pub tmp_dir: PathBuf,
    pub bin_path: String,
    pub hooks_path: Option<String>,
    pub plugins_path: Option<String>,
    pub run_in_pty: bool,
    pub command_eval: bool,
    pub git_submodules: bool,
    pub experiments: Vec<String>,
    pub redacted_vars: Vec<String>,
    pub interrupt_signal: InterruptSignal,
    pub timestamp_lines: bool,
    pub upload_queue_capacity: usize,
    pub job_log_dir: Option<PathBuf>,

    pub log_file: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://agent.buildkite.com/v3".to_string(),
            token: String::new(),
            worker_count: 1,
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
            heartbeat_interval: Duration::from_secs(30),
            ping_interval: Duration::from_secs(5),
            job_status_interval: Duration::from_secs(3),
            disconnect_after_idle_timeout: Duration::from_secs(0),
            cancel_grace_period: Duration::from_secs(10),
            output_flush_interval: Duration::from_secs(1),
            bootstrap_path: PathBuf::from("/usr/local/bin/buildkite-agent-bootstrap"),
            build_path: std::env::temp_dir().join("ja-builds"),
            tmp_dir: std::env::temp_dir(),
            bin_path: "/usr/local/bin/jobagentd".to_string(),
            hooks_path: None,
            plugins_path: None,
            run_in_pty: false,
            command_eval: true,
            git_submodules: true,
            experiments: Vec::new(),
            redacted_vars: vec!["BUILDKITE_AGENT_ACCESS_TOKEN".to_string()],
            interrupt_signal: InterruptSignal::Term,
            timestamp_lines: false,
            upload_queue_capacity: 1024,
            job_log_dir: None,
            log_file: None,
        }
    }
}

impl WorkerConfig {
    /// Assemble from defaults -> TOML file -> environment -> CLI flags.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = Cli::parse();
        Self::load_from(&cli)
    }

    fn load_from(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let config_path = cli.config.clone().or_else(|| std::env::var("JA_CONFIG_FILE").ok().map(PathBuf::from));
        if let Some(path) = config_path {
            config.apply_file(&path)?;
        }

        let os_env: std::collections::HashMap<String, String> = std::env::vars().collect();
        config.apply_env(&os_env);
        config.apply_cli(cli);

        if config.token.is_empty() {
            return Err(ConfigError::Missing("agent registration token"));
        }
        Ok(config)
    }

    fn apply_file(&mut self, path: &std::path::Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        let file: FileConfig = toml::from_str(&contents)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })?;
        file.merge_into(self);
        Ok(())
    }

    /// Reads from an explicit map (rather than `std::env` directly) so tests
    /// can exercise override precedence without mutating process-global
    /// environment state.
    fn apply_env(&mut self, env: &std::collections::HashMap<String, String>) {
        if let Some(v) = env.get("JA_ENDPOINT") {
            self.endpoint = v.clone();
        }
        if let Some(v) = env.get("JA_AGENT_TOKEN") {
            self.token = v.clone();
        }
        if let Some(v) = parse_env(env, "JA_WORKER_COUNT") {
            self.worker_count = v;
        }
        if let Some(v) = parse_env_ms(env, "JA_HEARTBEAT_INTERVAL_MS") {
            self.heartbeat_interval = v;
        }
        if let Some(v) = parse_env_ms(env, "JA_PING_INTERVAL_MS") {
            self.ping_interval = v;
        }
        if let Some(v) = parse_env_ms(env, "JA_JOB_STATUS_INTERVAL_MS") {
            self.job_status_interval = v;
        }
        if let Some(v) = parse_env_ms(env, "JA_DISCONNECT_AFTER_IDLE_MS") {
            self.disconnect_after_idle_timeout = v;
        }
        if let Some(v) = parse_env_ms(env, "JA_CANCEL_GRACE_PERIOD_MS") {
            self.cancel_grace_period = v;
        }
        if let Some(v) = env.get("JA_BOOTSTRAP_PATH") {
            self.bootstrap_path = PathBuf::from(v);
        }
        if let Some(v) = env.get("JA_BUILD_PATH") {
            self.build_path = PathBuf::from(v);
        }
        if let Some(v) = env.get("JA_LOG_FILE") {
            self.log_file = Some(PathBuf::from(v));
        }
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.endpoint {
            self.endpoint = v.clone();
        }
        if let Some(v) = &cli.token {
            self.token = v.clone();
        }
        if let Some(v) = cli.workers {
            self.worker_count = v;
        }
        if let Some(v) = &cli.bootstrap_path {
            self.bootstrap_path = v.clone();
        }
        if let Some(v) = &cli.build_path {
            self.build_path = v.clone();
        }
        if let Some(v) = &cli.log_file {
            self.log_file = Some(v.clone());
        }
        if cli.run_in_pty {
            self.run_in_pty = true;
        }
    }
}

fn parse_env<T: std::str::FromStr>(env: &std::collections::HashMap<String, String>, key: &str) -> Option<T> {
    env.get(key).and_then(|v| v.parse().ok())
}

fn parse_env_ms(env: &std::collections::HashMap<String, String>, key: &str) -> Option<Duration> {
    parse_env::<u64>(env, key).map(Duration::from_millis)
}

/// Partial config read from an optional TOML file. Every field is optional
/// so the file can override as little or as much as it wants.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
struct FileConfig {
    endpoint: Option<String>,
    token: Option<String>,
    worker_count: Option<usize>,
    heartbeat_interval_ms: Option<u64>,
    ping_interval_ms: Option<u64>,
    job_status_interval_ms: Option<u64>,
    disconnect_after_idle_ms: Option<u64>,
    cancel_grace_period_ms: Option<u64>,
    output_flush_interval_ms: Option<u64>,
    bootstrap_path: Option<PathBuf>,
    build_path: Option<PathBuf>,
    tmp_dir: Option<PathBuf>,
    bin_path: Option<String>,
    hooks_path: Option<String>,
    plugins_path: Option<String>,
    run_in_pty: Option<bool>,
    command_eval: Option<bool>,
    git_submodules: Option<bool>,
    experiments: Option<Vec<String>>,
    redacted_vars: Option<Vec<String>>,
    timestamp_lines: Option<bool>,
    upload_queue_capacity: Option<usize>,
    job_log_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

impl FileConfig {
    fn merge_into(self, config: &mut WorkerConfig) {
        if let Some(v) = self.endpoint {
            config.endpoint = v;
        }
        if let Some(v) = self.token {
            config.token = v;
        }
        if let Some(v) = self.worker_count {
            config.worker_count = v;
        }
        if let Some(v) = self.heartbeat_interval_ms {
            config.heartbeat_interval = Duration::from_millis(v);
        }
        if let Some(v) = self.ping_interval_ms {
            config.ping_interval = Duration::from_millis(v);
        }
        if let Some(v) = self.job_status_interval_ms {
            config.job_status_interval = Duration::from_millis(v);
        }
        if let Some(v) = self.disconnect_after_idle_ms {
            config.disconnect_after_idle_timeout = Duration::from_millis(v);
        }
        if let Some(v) = self.cancel_grace_period_ms {
            config.cancel_grace_period = Duration::from_millis(v);
        }
        if let Some(v) = self.output_flush_interval_ms {
            config.output_flush_interval = Duration::from_millis(v);
        }
        if let Some(v) = self.bootstrap_path {
            config.bootstrap_path = v;
        }
        if let Some(v) = self.build_path {
            config.build_path = v;
        }
        if let Some(v) = self.tmp_dir {
            config.tmp_dir = v;
        }
        if let Some(v) = self.bin_path {
            config.bin_path = v;
        }
        if self.hooks_path.is_some() {
            config.hooks_path = self.hooks_path;
        }
        if self.plugins_path.is_some() {
            config.plugins_path = self.plugins_path;
        }
        if let Some(v) = self.run_in_pty {
            config.run_in_pty = v;
        }
        if let Some(v) = self.command_eval {
            config.command_eval = v;
        }
        if let Some(v) = self.git_submodules {
            config.git_submodules = v;
        }
        if let Some(v) = self.experiments {
            config.experiments = v;
        }
        if let Some(v) = self.redacted_vars {
            config.redacted_vars = v;
        }
        if let Some(v) = self.timestamp_lines {
            config.timestamp_lines = v;
        }
        if let Some(v) = self.upload_queue_capacity {
            config.upload_queue_capacity = v;
        }
        if self.job_log_dir.is_some() {
            config.job_log_dir = self.job_log_dir;
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file;
        }
    }
}

/// `jobagentd` CLI flags. Everything is optional so absence falls through to
/// the environment or the file/default layers beneath it.
#[derive(Debug, Parser)]
#[command(name = "jobagentd", about = "Job execution core agent daemon")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    endpoint: Option<String>,

    #[arg(long)]
    token: Option<String>,

    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    bootstrap_path: Option<PathBuf>,

    #[arg(long)]
    build_path: Option<PathBuf>,

    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long)]
    run_in_pty: bool,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
