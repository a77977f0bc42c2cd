// SPDX-License-Identifier: MIT

use super::*;
use std::time::Duration;
use tokio::time::timeout;

fn echo_config(text: &str) -> ProcessConfig {
    ProcessConfig::new("/bin/echo", std::env::temp_dir()).arg(text)
}

#[tokio::test]
async fn happy_path_collects_output_and_exit_code() {
    let process = Process::spawn(echo_config("hello world")).await.unwrap();
    process.handle().wait_done().await;
    assert_eq!(process.handle().wait_status().unwrap().exit_code, 0);

    let mut rx = process.take_output().unwrap();
    let mut collected = Vec::new();
    while let Some(chunk) = rx.recv().await {
        collected.extend(chunk);
    }
    assert_eq!(String::from_utf8(collected).unwrap(), "hello world\n");
}

#[tokio::test]
async fn take_output_returns_none_on_second_call() {
    let process = Process::spawn(echo_config("once")).await.unwrap();
    assert!(process.take_output().is_some());
    assert!(process.take_output().is_none());
    process.handle().wait_done().await;
}

#[tokio::test]
async fn launch_failure_reports_descriptive_error() {
    let config = ProcessConfig::new("/no/such/binary-ja-process-test", std::env::temp_dir());
    let err = Process::spawn(config).await.unwrap_err();
    assert!(matches!(err, ProcessError::Launch { .. }));
}

#[tokio::test]
async fn interrupt_then_terminate_is_idempotent_and_kills_sleeper() {
    let config = ProcessConfig::new("/bin/sleep", std::env::temp_dir()).arg("30");
    let process = Process::spawn(config).await.unwrap();
    process.handle().wait_started().await;

    process.interrupt();
    process.interrupt();
    process.terminate();
    process.terminate();

    timeout(Duration::from_secs(5), process.handle().wait_done())
        .await
        .expect("process should have been killed");
}
