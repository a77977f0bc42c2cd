// SPDX-License-Identifier: MIT

//! Scenario 4: the child ignores the interrupt signal entirely, so the
//! grace-period enforcer must forcibly kill it.

use crate::support::{base_config, posix_script};
use ja_core::{FakeClock, Job, SignalReason};
use ja_engine::{JobCancelSignal, JobRunner};
use ja_wire::fake::FakeCoordinator;
use ja_wire::{Coordinator, JobState};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn a_child_that_ignores_interrupt_is_killed_after_the_grace_period() {
    let tmp = tempfile::tempdir().unwrap();
    let bootstrap = posix_script(&tmp, "bootstrap.sh", "trap '' TERM; sleep 30 & wait");
    let coordinator = Arc::new(FakeCoordinator::new());
    coordinator.script_job_state(Ok(JobState::Canceling));
    let mut config = base_config(&tmp, bootstrap);
    config.cancel_grace_period = Duration::from_millis(300);
    let runner = JobRunner::new(coordinator as Arc<dyn Coordinator>, config, FakeClock::new());

    let job = Job::fixture("job-grace-kill-e2e");
    let started = tokio::time::Instant::now();
    let status = tokio::time::timeout(
        Duration::from_secs(5),
        runner.run(job, Arc::new(JobCancelSignal::new())),
    )
    .await
    .expect("the grace-period kill must land well before the 30s sleep completes")
    .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(status.signal_reason, Some(SignalReason::Cancel));
    assert!(status.signal.is_some(), "a forcible kill must report the terminating signal");
    assert!(
        elapsed < Duration::from_secs(3),
        "kill should land around grace_period + epsilon, not the child's own sleep duration"
    );
}
