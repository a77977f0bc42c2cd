// SPDX-License-Identifier: MIT

//! Invariants 1 and 2: chunks for a job are contiguous in sequence order
//! and none of them exceeds `Job.chunks_max_size_bytes`, for arbitrary
//! output a child process might produce.

use crate::support::base_config;
use ja_core::{FakeClock, Job};
use ja_engine::{JobCancelSignal, JobRunner};
use ja_wire::fake::FakeCoordinator;
use ja_wire::Coordinator;
use proptest::prelude::*;
use std::sync::Arc;

fn run_with_bytes(bytes: &[u8], max_chunk_size: u64) -> (String, Vec<u8>) {
    let tmp = tempfile::tempdir().unwrap();
    let input_path = tmp.path().join("input.bin");
    std::fs::write(&input_path, bytes).unwrap();
    let bootstrap =
        crate::support::posix_script(&tmp, "bootstrap.sh", &format!("cat '{}'; exit 0", input_path.display()));

    let coordinator = Arc::new(FakeCoordinator::new());
    let mut config = base_config(&tmp, bootstrap);
    config.output_flush_interval = std::time::Duration::from_millis(5);
    let runner = JobRunner::new(coordinator.clone() as Arc<dyn Coordinator>, config, FakeClock::new());

    let mut job = Job::fixture("job-contiguity");
    job.chunks_max_size_bytes = max_chunk_size;

    let rt = tokio::runtime::Runtime::new().unwrap();
    let status = rt
        .block_on(runner.run(job, Arc::new(JobCancelSignal::new())))
        .unwrap();

    let mut chunks: Vec<_> = coordinator
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            ja_wire::fake::RecordedCall::UploadChunk { chunk, .. } => Some(chunk),
            _ => None,
        })
        .collect();
    chunks.sort_by_key(|c| c.sequence);

    for chunk in &chunks {
        assert!(chunk.size <= max_chunk_size, "no chunk may exceed chunks_max_size_bytes");
    }
    for window in chunks.windows(2) {
        assert_eq!(
            window[0].end_offset(),
            window[1].offset,
            "chunk[i].offset + chunk[i].size must equal chunk[i+1].offset"
        );
    }

    let concatenated: Vec<u8> = chunks.iter().flat_map(|c| c.data.clone()).collect();
    (status.exit_status.unwrap_or_default(), concatenated)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn chunks_reassemble_exactly_and_respect_the_size_bound(
        bytes in proptest::collection::vec(any::<u8>(), 0..400),
        max_chunk_size in 1u64..32,
    ) {
        let (exit_status, reassembled) = run_with_bytes(&bytes, max_chunk_size);
        prop_assert_eq!(exit_status, "0");
        prop_assert_eq!(reassembled, bytes);
    }
}
