use super::*;
use ja_core::{FakeClock, Job};
use ja_wire::fake::{FakeCoordinator, RecordedCall};
use ja_wire::JobState;
use std::io::Write as _;
use std::os::unix::fs::PermissionsExt;

fn posix_script(tmp: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = tmp.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "#!/bin/sh\n{body}").unwrap();
    drop(file);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o700)).unwrap();
    path
}

fn base_config(tmp: &tempfile::TempDir, bootstrap: PathBuf) -> JobRunnerConfig {
    JobRunnerConfig {
        bootstrap_path: bootstrap,
        build_path: tmp.path().to_path_buf(),
        tmp_dir: tmp.path().to_path_buf(),
        agent_overrides: AgentOverrides {
            endpoint: "https://coordinator.example".into(),
            access_token: "token".into(),
            agent_pid: 1,
            bin_path: "/usr/local/bin/ja-agent".into(),
            build_path: tmp.path().display().to_string(),
            ..Default::default()
        },
        interrupt_signal: InterruptSignal::Term,
        run_in_pty: false,
        cancel_grace_period: Duration::from_millis(200),
        job_status_interval: Duration::from_millis(30),
        output_flush_interval: Duration::from_millis(20),
        timestamp_lines: false,
        upload_queue_capacity: 16,
        job_log_dir: None,
    }
}

#[tokio::test]
async fn happy_path_uploads_output_and_reports_success() {
    let tmp = tempfile::tempdir().unwrap();
    let bootstrap = posix_script(&tmp, "bootstrap.sh", "printf 'hello world\\n'; exit 0");
    let coordinator = Arc::new(FakeCoordinator::new());
    let config = base_config(&tmp, bootstrap);
    let runner = JobRunner::new(coordinator.clone() as Arc<dyn Coordinator>, config, FakeClock::new());

    let job = Job::fixture("job-happy");
    let cancel = Arc::new(JobCancelSignal::new());
    let status = runner.run(job, cancel).await.unwrap();

    assert_eq!(status.exit_status.as_deref(), Some("0"));
    assert!(status.signal.is_none());

    let uploaded: Vec<u8> = coordinator
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            RecordedCall::UploadChunk { chunk, .. } => Some(chunk.data),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(String::from_utf8(uploaded).unwrap(), "hello world\n");

    let finished = coordinator
        .calls()
        .into_iter()
        .any(|c| matches!(c, RecordedCall::FinishJob { .. }));
    assert!(finished);
}

#[tokio::test]
async fn launch_failure_reports_process_run_error() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("does-not-exist");
    let coordinator = Arc::new(FakeCoordinator::new());
    let config = base_config(&tmp, missing);
    let runner = JobRunner::new(coordinator as Arc<dyn Coordinator>, config, FakeClock::new());

    let job = Job::fixture("job-missing");
    let cancel = Arc::new(JobCancelSignal::new());
    let status = runner.run(job, cancel).await.unwrap();

    assert_eq!(status.exit_status.as_deref(), Some("-1"));
    assert_eq!(status.signal_reason, Some(SignalReason::ProcessRunError));
}

#[tokio::test]
async fn cancel_requested_by_coordinator_interrupts_the_process() {
    let tmp = tempfile::tempdir().unwrap();
    let bootstrap = posix_script(&tmp, "bootstrap.sh", "trap 'exit 0' TERM; sleep 5 & wait");
    let coordinator = Arc::new(FakeCoordinator::new());
    coordinator.script_job_state(Ok(JobState::Canceling));
    let config = base_config(&tmp, bootstrap);
    let runner = JobRunner::new(coordinator.clone() as Arc<dyn Coordinator>, config, FakeClock::new());

    let job = Job::fixture("job-cancel");
    let cancel = Arc::new(JobCancelSignal::new());

    let status = tokio::time::timeout(Duration::from_secs(5), runner.run(job, cancel))
        .await
        .expect("job should be cancelled well before the 5s sleep completes")
        .unwrap();

    assert_eq!(status.signal_reason, Some(SignalReason::Cancel));
}

#[tokio::test]
async fn external_stop_request_is_honored_even_without_a_coordinator_cancel() {
    let tmp = tempfile::tempdir().unwrap();
    let bootstrap = posix_script(&tmp, "bootstrap.sh", "trap 'exit 0' TERM; sleep 5 & wait");
    let coordinator = Arc::new(FakeCoordinator::new());
    let config = base_config(&tmp, bootstrap);
    let runner = JobRunner::new(coordinator as Arc<dyn Coordinator>, config, FakeClock::new());

    let job = Job::fixture("job-agent-stop");
    let cancel = Arc::new(JobCancelSignal::new());
    let cancel_for_stop = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_for_stop.request(SignalReason::AgentStop);
    });

    let status = tokio::time::timeout(Duration::from_secs(5), runner.run(job, cancel))
        .await
        .expect("external stop should short-circuit the 5s sleep")
        .unwrap();

    assert_eq!(status.signal_reason, Some(SignalReason::AgentStop));
}
