// SPDX-License-Identifier: MIT

//! Scenario 3: the coordinator reports the job as canceling while the
//! child is still sleeping; the job must be interrupted and finish with
//! `SignalReason::Cancel` well before its own sleep would complete.

use crate::support::{base_config, posix_script};
use ja_core::{FakeClock, Job, SignalReason};
use ja_engine::{JobCancelSignal, JobRunner};
use ja_wire::fake::FakeCoordinator;
use ja_wire::{Coordinator, JobState};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn canceling_state_interrupts_a_sleeping_child() {
    let tmp = tempfile::tempdir().unwrap();
    // Exits 0 on TERM if it gets the chance, rather than dying by signal,
    // so we can assert on SignalReason without caring which exit path won.
    let bootstrap = posix_script(&tmp, "bootstrap.sh", "trap 'exit 0' TERM; sleep 10 & wait");
    let coordinator = Arc::new(FakeCoordinator::new());
    coordinator.script_job_state(Ok(JobState::Other));
    coordinator.script_job_state(Ok(JobState::Canceling));
    let config = base_config(&tmp, bootstrap);
    let runner = JobRunner::new(coordinator as Arc<dyn Coordinator>, config, FakeClock::new());

    let job = Job::fixture("job-cancel-e2e");
    let status = tokio::time::timeout(
        Duration::from_secs(5),
        runner.run(job, Arc::new(JobCancelSignal::new())),
    )
    .await
    .expect("cancel should land well before the 10s sleep completes")
    .unwrap();

    assert_eq!(status.signal_reason, Some(SignalReason::Cancel));
}
