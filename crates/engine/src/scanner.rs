// SPDX-License-Identifier: MIT

//! Line/header classification over a process's raw output stream, with an
//! optional ANSI timestamp-marker prefixer.

use ja_core::{Clock, HeaderTimes};

/// Lines longer than this are split at the cap rather than buffered
/// unboundedly.
const SOFT_LINE_CAP: usize = 1024 * 1024;

const HEADER_MARKERS: [&[u8]; 4] = [b"+++", b"---", b"~~~", b"^^^"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Header,
    /// `^^^ +++` / `^^^ ---`: expands/collapses the previous header. Not a
    /// new header (no timestamp recorded) and excluded from re-prefixing.
    HeaderExpansion,
    Plain,
}

/// Consumes raw output bytes as they arrive, classifying each line and
/// recording a timestamp for every header line. When `timestamp_lines` is
/// set, also injects an ANSI marker in front of every line that isn't a
/// header-expansion line.
pub struct Scanner<C: Clock> {
    clock: C,
    timestamp_lines: bool,
    partial: Vec<u8>,
    line_number: u64,
    header_times: HeaderTimes,
}

impl<C: Clock> Scanner<C> {
    pub fn new(clock: C, timestamp_lines: bool) -> Self {
        Self { clock, timestamp_lines, partial: Vec::new(), line_number: 0, header_times: HeaderTimes::new() }
    }

    pub fn header_times_mut(&mut self) -> &mut HeaderTimes {
        &mut self.header_times
    }

    /// Feed newly arrived bytes; returns the bytes that should be appended
    /// to the tee buffer (the input, or the input with timestamp markers
    /// injected, depending on configuration).
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(bytes.len());
        for &b in bytes {
            self.partial.push(b);
            if b == b'\n' || b == b'\r' || self.partial.len() >= SOFT_LINE_CAP {
                self.flush_line(&mut out);
            }
        }
        out
    }

    /// Flushes a final partial line with no trailing separator. Call once
    /// after the source stream ends.
    pub fn finish(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        if !self.partial.is_empty() {
            self.flush_line(&mut out);
        }
        out
    }

    fn flush_line(&mut self, out: &mut Vec<u8>) {
        let line = std::mem::take(&mut self.partial);
        self.line_number += 1;
        let kind = classify(&line);

        if kind == LineKind::Header {
            let ts = rfc3339_nanos(self.clock.epoch_ms());
            self.header_times.record(self.line_number, ts);
        }

        if self.timestamp_lines && kind != LineKind::HeaderExpansion {
            out.extend_from_slice(&timestamp_marker(self.clock.epoch_ms()));
        }
        out.extend_from_slice(&line);
    }
}

fn classify(line: &[u8]) -> LineKind {
    let trimmed = trim_leading_ws(line);
    if starts_with(trimmed, b"^^^ +++") || starts_with(trimmed, b"^^^ ---") {
        return LineKind::HeaderExpansion;
    }
    for marker in HEADER_MARKERS {
        if starts_with(trimmed, marker) {
            let after = &trimmed[marker.len()..];
            if after.is_empty() || after[0].is_ascii_whitespace() {
                return LineKind::Header;
            }
        }
    }
    LineKind::Plain
}

fn trim_leading_ws(line: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < line.len() && (line[i] == b' ' || line[i] == b'\t') {
        i += 1;
    }
    &line[i..]
}

fn starts_with(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && &haystack[..needle.len()] == needle
}

/// `ESC _ bk;t=<unix-millis> BEL`.
fn timestamp_marker(epoch_ms: u64) -> Vec<u8> {
    format!("\x1b_bk;t={epoch_ms}\x07").into_bytes()
}

fn rfc3339_nanos(epoch_ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(epoch_ms as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
