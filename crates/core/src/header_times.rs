// SPDX-License-Identifier: MIT

//! Timestamps recorded for "expand/collapse header" lines in job output.

use std::collections::BTreeMap;

/// An ordered, growable set of RFC3339-nanosecond timestamps keyed by the
/// line number of the header line that produced them.
///
/// Keys are formatted `"header:<line-number>"` to match the coordinator's
/// `save-header-times` body shape (`{times: {...}}`).
#[derive(Debug, Clone, Default)]
pub struct HeaderTimes {
    entries: BTreeMap<u64, String>,
}

impl HeaderTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_for_line(line_number: u64) -> String {
        format!("header:{line_number}")
    }

    /// Record a header line's timestamp. Overwrites any prior entry for the
    /// same line (lines are only visited once, but this keeps the type total).
    pub fn record(&mut self, line_number: u64, timestamp_rfc3339_nanos: impl Into<String>) {
        self.entries.insert(line_number, timestamp_rfc3339_nanos.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Take up to `n` of the oldest (lowest line-number) un-flushed entries,
    /// removing them from this set. Used by the periodic flush to ship
    /// cursor-windowed batches without holding everything in memory forever.
    pub fn take_batch(&mut self, n: usize) -> BTreeMap<String, String> {
        let keys: Vec<u64> = self.entries.keys().take(n).copied().collect();
        let mut batch = BTreeMap::new();
        for key in keys {
            if let Some(v) = self.entries.remove(&key) {
                batch.insert(Self::key_for_line(key), v);
            }
        }
        batch
    }

    /// Drain everything, for the final flush on scanner stop.
    pub fn take_all(&mut self) -> BTreeMap<String, String> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(line, ts)| (Self::key_for_line(line), ts))
            .collect()
    }
}

#[cfg(test)]
#[path = "header_times_tests.rs"]
mod tests;
