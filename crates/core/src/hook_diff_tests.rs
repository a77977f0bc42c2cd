// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn empty_diff_reports_empty() {
    assert!(HookEnvDiff::default().is_empty());
}

#[test]
fn non_empty_diff_reports_not_empty() {
    let mut diff = HookEnvDiff::default();
    diff.added.insert("A".to_string(), "1".to_string());
    assert!(!diff.is_empty());
}
