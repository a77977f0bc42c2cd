// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ja-hooks: materializes a shell/batch/powershell wrapper around a user
//! hook script that records its environment and working directory before
//! and after the hook runs, then diffs the two dumps.

mod error;
mod template;
mod wrapper;

pub use error::HookError;
pub use template::Shell;
pub use wrapper::{HookWrapper, TargetOs};
