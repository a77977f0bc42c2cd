// SPDX-License-Identifier: MIT

//! A bounded byte range of a job's captured output, ready for upload.

use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One uploadable slice of a job's combined stdout/stderr stream.
///
/// Chunks for a given job are non-overlapping and contiguous: chunk `n`'s
/// `offset` equals the sum of `size` over chunks `0..n`. The coordinator
/// reassembles by `offset`; `sequence` is only a dispatch-order hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogChunk {
    pub offset: u64,
    pub size: u64,
    pub sequence: u64,
    #[serde(serialize_with = "serialize_data", deserialize_with = "deserialize_data")]
    pub data: Vec<u8>,
}

impl LogChunk {
    /// Build a chunk, asserting the invariants callers must already uphold:
    /// `size` matches `data.len()` and neither is zero.
    pub fn new(offset: u64, sequence: u64, data: Vec<u8>) -> Self {
        debug_assert!(!data.is_empty(), "log chunks are never empty");
        Self { offset, size: data.len() as u64, sequence, data }
    }

    /// Offset immediately following this chunk, i.e. where the next
    /// contiguous chunk must begin.
    pub fn end_offset(&self) -> u64 {
        self.offset + self.size
    }
}

// Chunk bodies travel as base64 text inside the JSON envelope on the wire,
// not raw bytes.
fn serialize_data<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    base64::engine::general_purpose::STANDARD.encode(data).serialize(serializer)
}

fn deserialize_data<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
#[path = "chunk_tests.rs"]
mod tests;
