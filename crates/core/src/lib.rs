// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ja-core: shared domain types for the job agent's execution core —
//! identifiers, the job record, log chunks, header timestamps, hook
//! environment diffs, worker/idle bookkeeping, and retry policy shapes.
//! Free of I/O so every other crate in the workspace can depend on it
//! without pulling in tokio, reqwest, or process-spawning code.

pub mod macros;

pub mod chunk;
pub mod clock;
pub mod header_times;
pub mod hook_diff;
pub mod id;
pub mod idle_monitor;
pub mod job;
pub mod retry;
pub mod worker_id;
pub mod worker_state;

pub use chunk::LogChunk;
pub use clock::{Clock, FakeClock, SystemClock};
pub use header_times::HeaderTimes;
pub use hook_diff::{ChangedVar, HookEnvDiff};
pub use id::{short, IdBuf, ID_MAX_LEN};
pub use idle_monitor::IdleMonitor;
pub use job::{Job, JobId, JobStatus, SignalReason};
pub use retry::{next_delay, AlwaysRetry, RetryClassifier, RetryPolicy};
pub use worker_id::WorkerId;
pub use worker_state::{WorkerIntervals, WorkerState};
