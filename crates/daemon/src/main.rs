// SPDX-License-Identifier: MIT

//! `jobagentd`: the agent daemon binary. Loads configuration, spawns a pool
//! of agent workers, and drives the host-interrupt-driven shutdown sequence
//! (first interrupt = graceful stop, second = escalate to cancel).

use ja_core::{IdleMonitor, SystemClock, WorkerId, WorkerIntervals};
use ja_daemon::{spawn_pool, AgentWorker, WorkerConfig};
use ja_engine::{AgentOverrides, JobRunnerConfig};
use ja_wire::HttpCoordinator;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = WorkerConfig::load()?;
    let _log_guard = ja_daemon::init_logging(&config)?;

    tracing::info!(workers = config.worker_count, endpoint = %config.endpoint, "starting job agent daemon");

    let coordinator: Arc<dyn ja_wire::Coordinator> =
        Arc::new(HttpCoordinator::new(config.endpoint.clone(), config.token.clone()));
    let idle = Arc::new(IdleMonitor::new(config.worker_count));
    let clock = SystemClock;

    let intervals = WorkerIntervals {
        heartbeat_interval: config.heartbeat_interval,
        ping_interval: config.ping_interval,
        job_status_interval: config.job_status_interval,
    };

    let runner_config = JobRunnerConfig {
        bootstrap_path: config.bootstrap_path.clone(),
        build_path: config.build_path.clone(),
        tmp_dir: config.tmp_dir.clone(),
        agent_overrides: AgentOverrides {
            endpoint: config.endpoint.clone(),
            access_token: config.token.clone(),
            agent_pid: std::process::id(),
            bin_path: config.bin_path.clone(),
            build_path: config.build_path.display().to_string(),
            hooks_path: config.hooks_path.clone(),
            plugins_path: config.plugins_path.clone(),
            run_in_pty: config.run_in_pty,
            command_eval: config.command_eval,
            git_submodules: config.git_submodules,
            experiments: config.experiments.clone(),
            redacted_vars: config.redacted_vars.clone(),
        },
        interrupt_signal: config.interrupt_signal,
        run_in_pty: config.run_in_pty,
        cancel_grace_period: config.cancel_grace_period,
        job_status_interval: config.job_status_interval,
        output_flush_interval: config.output_flush_interval,
        timestamp_lines: config.timestamp_lines,
        upload_queue_capacity: config.upload_queue_capacity,
        job_log_dir: config.job_log_dir.clone(),
    };

    let workers: Vec<_> = (0..config.worker_count)
        .map(|i| {
            AgentWorker::new(
                WorkerId::new(format!("worker-{i}")),
                coordinator.clone(),
                idle.clone(),
                clock.clone(),
                config.agent_version.clone(),
                intervals,
                config.disconnect_after_idle_timeout,
                runner_config.clone(),
            )
        })
        .collect();

    let (pool, handles, mut errors) = spawn_pool(workers);

    tokio::select! {
        result = ja_daemon::wait_for_interrupt() => {
            result?;
            tracing::info!("received interrupt, beginning graceful stop");
        }
        Some(err) = errors.recv() => {
            tracing::error!(error = %err, "a worker exited with an error; stopping the pool");
        }
    }
    pool.stop(true);

    let join_task = tokio::spawn(handles.join());
    tokio::pin!(join_task);
    tokio::select! {
        result = ja_daemon::wait_for_interrupt() => {
            result?;
            tracing::warn!("received second interrupt, escalating to cancel");
            pool.stop(false);
            let _ = join_task.await;
        }
        _ = &mut join_task => {}
    }

    tracing::info!("job agent daemon stopped");
    Ok(())
}
