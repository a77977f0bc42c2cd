// SPDX-License-Identifier: MIT

//! Scenario 1: a job whose child writes a short line and exits cleanly.

use crate::support::{base_config, posix_script};
use ja_core::{FakeClock, Job};
use ja_engine::{JobCancelSignal, JobRunner};
use ja_wire::fake::{FakeCoordinator, RecordedCall};
use ja_wire::Coordinator;
use std::sync::Arc;

#[tokio::test]
async fn happy_path_reports_start_chunks_and_finish() {
    let tmp = tempfile::tempdir().unwrap();
    let bootstrap = posix_script(&tmp, "bootstrap.sh", "printf 'hello world\\n'; exit 0");
    let coordinator = Arc::new(FakeCoordinator::new());
    let config = base_config(&tmp, bootstrap);
    let runner = JobRunner::new(coordinator.clone() as Arc<dyn Coordinator>, config, FakeClock::new());

    let mut job = Job::fixture("job-happy-e2e");
    job.chunks_max_size_bytes = 16;
    job.env.insert("K".to_string(), "V".to_string());
    let status = runner.run(job, Arc::new(JobCancelSignal::new())).await.unwrap();

    assert_eq!(status.exit_status.as_deref(), Some("0"));
    assert_eq!(status.signal, None);
    assert_eq!(status.signal_reason, None);

    let calls = coordinator.calls();
    let start_count = calls.iter().filter(|c| matches!(c, RecordedCall::StartJob { .. })).count();
    assert_eq!(start_count, 1, "StartJob must be called exactly once");

    let mut uploads: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            RecordedCall::UploadChunk { chunk, .. } => Some(chunk.clone()),
            _ => None,
        })
        .collect();
    uploads.sort_by_key(|c| c.sequence);
    let concatenated: Vec<u8> = uploads.iter().flat_map(|c| c.data.clone()).collect();
    assert_eq!(String::from_utf8(concatenated).unwrap(), "hello world\n");

    let finished = calls.iter().filter(|c| matches!(c, RecordedCall::FinishJob { .. })).count();
    assert_eq!(finished, 1);
}
