// SPDX-License-Identifier: MIT

//! Shared fixtures for the end-to-end scenarios: a POSIX script writer and
//! a baseline [`JobRunnerConfig`] every scenario starts from and tweaks
//! with struct-update syntax.

use ja_engine::{AgentOverrides, JobRunnerConfig};
use ja_process::InterruptSignal;
use std::io::Write as _;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

pub fn posix_script(tmp: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = tmp.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "#!/bin/sh\n{body}").unwrap();
    drop(file);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o700)).unwrap();
    path
}

pub fn base_config(tmp: &tempfile::TempDir, bootstrap: PathBuf) -> JobRunnerConfig {
    JobRunnerConfig {
        bootstrap_path: bootstrap,
        build_path: tmp.path().to_path_buf(),
        tmp_dir: tmp.path().to_path_buf(),
        agent_overrides: AgentOverrides {
            endpoint: "https://coordinator.example".into(),
            access_token: "token".into(),
            agent_pid: 1,
            bin_path: "/usr/local/bin/jobagentd".into(),
            build_path: tmp.path().display().to_string(),
            ..Default::default()
        },
        interrupt_signal: InterruptSignal::Term,
        run_in_pty: false,
        cancel_grace_period: Duration::from_millis(300),
        job_status_interval: Duration::from_millis(30),
        output_flush_interval: Duration::from_millis(20),
        timestamp_lines: false,
        upload_queue_capacity: 16,
        job_log_dir: None,
    }
}
