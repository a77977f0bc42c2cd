// SPDX-License-Identifier: MIT

use super::*;

fn intervals() -> WorkerIntervals {
    WorkerIntervals {
        heartbeat_interval: Duration::from_secs(30),
        ping_interval: Duration::from_secs(5),
        job_status_interval: Duration::from_secs(2),
    }
}

#[test]
fn fresh_state_is_running() {
    let state = WorkerState::new(intervals());
    assert!(!state.is_stopped());
    assert!(!state.is_cancelled());
    assert!(!state.is_disconnected());
    assert!(state.last_ping().is_none());
}

#[test]
fn request_stop_is_graceful_only() {
    let state = WorkerState::new(intervals());
    state.request_stop();
    assert!(state.is_stopped());
    assert!(!state.is_cancelled());
}

#[test]
fn request_cancel_implies_stopped() {
    let state = WorkerState::new(intervals());
    state.request_cancel();
    assert!(state.is_stopped());
    assert!(state.is_cancelled());
}

#[test]
fn record_ping_is_observable() {
    let state = WorkerState::new(intervals());
    let now = Instant::now();
    state.record_ping(now);
    assert_eq!(state.last_ping(), Some(now));
}

#[test]
fn mark_disconnected_is_sticky() {
    let state = WorkerState::new(intervals());
    state.mark_disconnected();
    assert!(state.is_disconnected());
}
