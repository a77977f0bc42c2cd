// SPDX-License-Identifier: MIT

use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

#[test]
fn define_id_hash_map_lookup() {
    let mut map = HashMap::new();
    map.insert(TestId::from_string("tst-k"), 42);
    assert_eq!(map.get("tst-k"), Some(&42));
}

#[test]
fn define_id_new_has_prefix() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
}

#[test]
fn define_id_round_trips_through_string() {
    let id = TestId::from_string("tst-abc123");
    assert_eq!(id.to_string(), "tst-abc123");
    assert_eq!(id, "tst-abc123");
}

#[test]
fn define_id_two_new_ids_differ() {
    assert_ne!(TestId::new(), TestId::new());
}

#[test]
fn short_fn_truncates() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
    assert_eq!(short(s, 100), s);
    assert_eq!(short("abc", 8), "abc");
}

#[test]
fn idbuf_truncates_overlong_input_instead_of_panicking() {
    let long = "x".repeat(ID_MAX_LEN + 10);
    let buf = IdBuf::new(&long);
    assert_eq!(buf.as_str().len(), ID_MAX_LEN);
}
