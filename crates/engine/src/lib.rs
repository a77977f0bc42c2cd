// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! ja-engine: the job execution core. Scans and chunks a job's output,
//! constructs its environment, and drives it through the
//! `created -> started -> running -> finishing -> done` lifecycle.

mod cancel;
mod env;
mod error;
mod job_logger;
mod runner;
mod scanner;
mod streamer;

pub use cancel::JobCancelSignal;
pub use env::AgentOverrides;
pub use error::RunnerError;
pub use job_logger::JobLogger;
pub use runner::{JobRunner, JobRunnerConfig};
