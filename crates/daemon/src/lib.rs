// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! ja-daemon: the Agent Worker and its pool — long-poll for a job, hand it
//! to `ja-engine`'s Job Runner, report heartbeats, and coordinate
//! idle/stop across a worker pool. Binary entry point: `jobagentd`.

mod config;
mod error;
mod logging;
mod pool;
mod signal;
mod worker;

pub use config::WorkerConfig;
pub use error::{ConfigError, WorkerError};
pub use logging::{init as init_logging, LogGuard};
pub use pool::{spawn_pool, WorkerPool, WorkerPoolHandles};
pub use signal::wait_for_interrupt;
pub use worker::AgentWorker;
