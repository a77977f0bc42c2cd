// SPDX-License-Identifier: MIT

use super::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn wait_returns_immediately_once_already_fired() {
    let latch = Latch::new();
    latch.fire();
    tokio::time::timeout(Duration::from_millis(50), latch.wait())
        .await
        .expect("wait() should not block once fired");
}

#[tokio::test]
async fn wait_unblocks_when_fired_concurrently() {
    let latch = Arc::new(Latch::new());
    let waiter = {
        let latch = latch.clone();
        tokio::spawn(async move { latch.wait().await })
    };
    tokio::task::yield_now().await;
    latch.fire();
    tokio::time::timeout(Duration::from_millis(200), waiter)
        .await
        .expect("latch wait timed out")
        .expect("waiter task panicked");
}

#[tokio::test]
async fn process_handle_lifecycle() {
    let handle = ProcessHandle::new();
    assert!(!handle.is_started());
    assert!(!handle.is_done());

    handle.mark_started();
    assert!(handle.is_started());
    handle.wait_started().await;

    handle.mark_done(WaitStatus { exit_code: 0, terminating_signal: None });
    assert!(handle.is_done());
    handle.wait_done().await;
    assert_eq!(handle.wait_status(), Some(WaitStatus { exit_code: 0, terminating_signal: None }));
}

#[test]
fn launch_failed_reports_minus_one() {
    assert_eq!(WaitStatus::launch_failed().exit_code, -1);
}
