// SPDX-License-Identifier: MIT

//! Retry policy shapes and the classifier contract every retrying caller
//! (coordinator HTTP calls, chunk uploads, hook spawns) is built against.
//!
//! This module only describes *when* to retry and *how long* to wait; it
//! does not perform I/O. `ja-wire` drives an actual [`backoff`](https://docs.rs/backoff)
//! executor from a [`RetryPolicy`]'s delay sequence.

use std::time::Duration;

/// Decides whether a particular error is worth retrying at all. Implemented
/// per call site: an HTTP classifier treats 5xx/connect errors as retryable
/// and 4xx as terminal, a chunk-upload classifier may treat a permanently
/// rejected chunk as terminal even though the transport succeeded.
pub trait RetryClassifier<E> {
    fn is_retryable(&self, err: &E) -> bool;
}

/// A classifier that retries everything. Useful as a default, or for
/// operations where every error is transient by construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E> RetryClassifier<E> for AlwaysRetry {
    fn is_retryable(&self, _err: &E) -> bool {
        true
    }
}

/// The two retry shapes used across the agent: a bounded number of
/// attempts at a fixed interval, or an unbounded retry loop (used for
/// coordinator connectivity, where giving up is never correct) with
/// optional jitter to avoid a thundering herd on reconnect.
#[derive(Debug, Clone, Copy)]
pub enum RetryPolicy {
    Fixed { max_attempts: u32, interval: Duration },
    Forever { interval: Duration, jitter: Option<Duration> },
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self::Fixed { max_attempts, interval }
    }

    pub fn forever(interval: Duration) -> Self {
        Self::Forever { interval, jitter: None }
    }

    pub fn forever_with_jitter(interval: Duration, jitter: Duration) -> Self {
        Self::Forever { interval, jitter: Some(jitter) }
    }

    /// Delay to wait before the `attempt`-th retry (1-based: the delay
    /// before the *second* overall try). `jitter_fraction` is in `[0, 1)`
    /// and scales the configured jitter window; callers supply their own
    /// randomness source so this stays deterministic under test.
    pub fn delay_for(&self, attempt: u32, jitter_fraction: f64) -> Option<Duration> {
        match *self {
            Self::Fixed { max_attempts, interval } => {
                if attempt < max_attempts {
                    Some(interval)
                } else {
                    None
                }
            }
            Self::Forever { interval, jitter } => {
                let jitter_fraction = jitter_fraction.clamp(0.0, 1.0);
                let extra = jitter
                    .map(|j| j.mul_f64(jitter_fraction))
                    .unwrap_or(Duration::ZERO);
                Some(interval + extra)
            }
        }
    }

    /// Whether a policy permits a given attempt number (1-based) at all,
    /// independent of the classifier. `Forever` never exhausts.
    pub fn permits_attempt(&self, attempt: u32) -> bool {
        match *self {
            Self::Fixed { max_attempts, .. } => attempt <= max_attempts,
            Self::Forever { .. } => true,
        }
    }
}

/// Runs `attempt` against `policy` and `classifier`, returning the delay to
/// sleep before retrying, or `None` if the caller should stop (either the
/// attempt succeeded, the error was classified as terminal, or the policy
/// is exhausted).
pub fn next_delay<T, E>(
    policy: &RetryPolicy,
    classifier: &impl RetryClassifier<E>,
    attempt: u32,
    result: &Result<T, E>,
    jitter_fraction: f64,
) -> Option<Duration> {
    let err = result.as_ref().err()?;
    if !classifier.is_retryable(err) {
        return None;
    }
    if !policy.permits_attempt(attempt + 1) {
        return None;
    }
    policy.delay_for(attempt, jitter_fraction)
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
