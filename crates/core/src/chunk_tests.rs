// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn new_computes_size_from_data_len() {
    let chunk = LogChunk::new(0, 0, b"hello".to_vec());
    assert_eq!(chunk.size, 5);
    assert_eq!(chunk.end_offset(), 5);
}

#[test]
fn contiguous_chunks_chain_end_to_end() {
    let a = LogChunk::new(0, 0, b"abc".to_vec());
    let b = LogChunk::new(a.end_offset(), 1, b"defgh".to_vec());
    assert_eq!(b.offset, 3);
    assert_eq!(b.end_offset(), 8);
}

#[test]
fn round_trips_through_json_as_base64() {
    let chunk = LogChunk::new(10, 2, vec![0, 1, 2, 255, 254]);
    let json = serde_json::to_string(&chunk).unwrap();
    assert!(json.contains("\"data\":\""));
    assert!(!json.contains("[0,1,2,255,254]"), "data must not serialize as a JSON byte array");
    let back: LogChunk = serde_json::from_str(&json).unwrap();
    assert_eq!(back, chunk);
}
