// SPDX-License-Identifier: MIT

//! Scenario 2: header lines are detected and their timestamps shipped via
//! `SaveHeaderTimes`, while plain body lines carry no such annotation.

use crate::support::{base_config, posix_script};
use ja_core::{FakeClock, Job};
use ja_engine::{JobCancelSignal, JobRunner};
use ja_wire::fake::{FakeCoordinator, RecordedCall};
use ja_wire::Coordinator;
use std::collections::BTreeMap;
use std::sync::Arc;

#[tokio::test]
async fn two_header_lines_are_recorded_with_increasing_timestamps() {
    let tmp = tempfile::tempdir().unwrap();
    let bootstrap =
        posix_script(&tmp, "bootstrap.sh", "printf '~~~ step1\\n+++ step2\\nbody\\n'; exit 0");
    let coordinator = Arc::new(FakeCoordinator::new());
    let config = base_config(&tmp, bootstrap);
    let runner = JobRunner::new(coordinator.clone() as Arc<dyn Coordinator>, config, FakeClock::new());

    let job = Job::fixture("job-headers-e2e");
    let status = runner.run(job, Arc::new(JobCancelSignal::new())).await.unwrap();
    assert_eq!(status.exit_status.as_deref(), Some("0"));

    let mut all_times: BTreeMap<String, String> = BTreeMap::new();
    for call in coordinator.calls() {
        if let RecordedCall::SaveHeaderTimes { times, .. } = call {
            all_times.extend(times);
        }
    }

    assert_eq!(all_times.len(), 2, "exactly the two header lines should be recorded, not the body line");

    let first = all_times.get("header:1").expect("line 1 (~~~ step1) is a header");
    let second = all_times.get("header:2").expect("line 2 (+++ step2) is a header");
    assert!(first <= second, "header timestamps must be non-decreasing in line order");
    assert!(
        !all_times.contains_key("header:3"),
        "the plain `body` line must not produce a header-times entry"
    );
}
