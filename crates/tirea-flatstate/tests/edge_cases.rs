//! Edge case tests for path resolution and mutation.

use serde_json::json;
use tirea_flatstate::{path, FlatError, FlatState, Path, Value};

fn state(json: serde_json::Value) -> FlatState {
    FlatState::from_json(json).unwrap()
}

// ============================================================================
// set / get
// ============================================================================

#[test]
fn test_set_then_get_returns_value() {
    let s = FlatState::new();
    let cases = [
        (path!("a"), json!(1)),
        (path!("b", "c"), json!("x")),
        (path!("d", 0), json!(true)),
        (path!("e", 0, "f", 0, "g"), json!({"h": [1, 2]})),
        (path!("nil"), json!(null)),
    ];
    for (p, v) in cases {
        s.set(&p, v.clone()).unwrap();
        assert_eq!(s.get(&p).unwrap(), v, "{p}");
    }
}

#[test]
fn test_creation_heuristic_follows_next_key() {
    let s = FlatState::new();
    s.set(&path!("a", 0, "b"), "x").unwrap();
    assert_eq!(s.to_json(), json!({"a": [{"b": "x"}]}));
}

#[test]
fn test_creation_heuristic_ignores_current_key_kind() {
    // The index segment creates a mapping because the key after it is a string.
    let s = state(json!({"rows": []}));
    s.set(&path!("rows", 0, "cells", 0), 7).unwrap();
    assert_eq!(s.to_json(), json!({"rows": [{"cells": [7]}]}));
}

#[test]
fn test_set_replaces_container_wholesale() {
    let s = state(json!({"user": {"name": "Alice", "age": 30}}));
    s.set(&path!("user"), json!({"name": "Bob"})).unwrap();
    assert_eq!(s.get(&path!("user")).unwrap(), json!({"name": "Bob"}));
    assert_eq!(s.get(&path!("user", "age")), None);
}

#[test]
fn test_get_missing_intermediates_is_not_found() {
    let s = state(json!({"a": {"b": 1}}));
    assert_eq!(s.get(&path!("x", "y", "z")), None);
    assert_eq!(s.get(&path!("a", "b", "c")), None);
}

#[test]
fn test_not_found_is_distinct_from_null() {
    let s = state(json!({"a": null}));
    assert_eq!(s.get(&path!("a")), Some(Value::Null));
    assert_eq!(s.get(&path!("b")), None);
}

#[test]
fn test_negative_index_reads_from_end() {
    let s = state(json!({"l": [10, 20, 30]}));
    let n = s.size(&path!("l")) as i64;
    assert_eq!(s.get(&path!("l", -1)), s.get(&path!("l", n - 1)));
    assert_eq!(s.get(&path!("l", -3)).unwrap(), json!(10));
    assert_eq!(s.get(&path!("l", -4)), None);
}

#[test]
fn test_negative_index_past_start_fails_write() {
    let s = state(json!({"l": [1]}));
    let err = s.set(&path!("l", -2), 0).unwrap_err();
    assert!(matches!(err, FlatError::IndexOutOfBounds { index: -2, len: 1, .. }));
    assert_eq!(s.to_json(), json!({"l": [1]}));
}

#[test]
fn test_negative_index_on_empty_intermediate_fails() {
    let s = FlatState::new();
    let err = s.set(&path!("l", -1, "x"), 0).unwrap_err();
    assert!(matches!(err, FlatError::IndexOutOfBounds { .. }));
    // Nothing was attached to the tree.
    assert_eq!(s.to_json(), json!({}));
}

#[test]
fn test_key_on_sequence_mid_path() {
    let s = state(json!({"l": [1, 2]}));
    assert_eq!(s.get(&path!("l", "first")), None);
    let err = s.set(&path!("l", "first"), 0).unwrap_err();
    assert!(matches!(
        err,
        FlatError::TypeMismatch { expected: "mapping", found: "sequence", .. }
    ));
}

#[test]
fn test_index_on_mapping_mid_path() {
    let s = state(json!({"m": {"0": "zero"}}));
    assert_eq!(s.get(&path!("m", 0)), None);
    assert_eq!(s.get(&path!("m", "0")).unwrap(), json!("zero"));
    let err = s.set(&path!("m", 0, "x"), 0).unwrap_err();
    assert!(matches!(
        err,
        FlatError::TypeMismatch { expected: "sequence", found: "mapping", ref path, .. }
            if *path == path!("m")
    ));
}

#[test]
fn test_primitive_intermediate_fails_write() {
    let s = state(json!({"a": "text"}));
    let err = s.set(&path!("a", "b"), 1).unwrap_err();
    assert!(matches!(err, FlatError::TypeMismatch { found: "string", .. }));
    assert_eq!(s.get(&path!("a")).unwrap(), json!("text"));
}

#[test]
fn test_empty_path_rejected_by_writes() {
    let s = state(json!([1]));
    let root = Path::root();
    assert!(matches!(s.set(&root, 1), Err(FlatError::InvalidPath { .. })));
    assert!(matches!(s.append(&root, 1), Err(FlatError::InvalidPath { .. })));
    assert!(matches!(s.insert(&root, 0, 1), Err(FlatError::InvalidPath { .. })));
    assert!(matches!(s.destroy(&root, 0), Err(FlatError::InvalidPath { .. })));
    assert!(matches!(s.toggle(&root), Err(FlatError::InvalidPath { .. })));
    assert_eq!(s.to_json(), json!([1]));
}

#[test]
fn test_dotted_paths_drive_the_engine() {
    let s = FlatState::new();
    let p = Path::parse("form.items.0.title").unwrap();
    s.set(&p, "first").unwrap();
    assert_eq!(s.to_json(), json!({"form": {"items": [{"title": "first"}]}}));
    assert_eq!(
        s.get(&Path::parse("form.items.-1.title").unwrap()).unwrap(),
        json!("first")
    );
}

// ============================================================================
// append
// ============================================================================

#[test]
fn test_append_on_absent_creates_single_element() {
    let s = FlatState::new();
    s.append(&path!("a", "b"), "v").unwrap();
    assert_eq!(s.get(&path!("a", "b")).unwrap(), json!(["v"]));
}

#[test]
fn test_append_to_existing() {
    let s = state(json!({"l": [1]}));
    s.append(&path!("l"), 2).unwrap();
    s.append(&path!("l"), json!({"k": 3})).unwrap();
    assert_eq!(s.get(&path!("l")).unwrap(), json!([1, 2, {"k": 3}]));
}

#[test]
fn test_append_to_mapping_fails() {
    let s = state(json!({"m": {}}));
    let err = s.append(&path!("m"), 1).unwrap_err();
    assert!(matches!(err, FlatError::TypeMismatch { found: "mapping", .. }));
}

// ============================================================================
// insert / destroy
// ============================================================================

#[test]
fn test_insert_at_front() {
    let s = state(json!({"l": ["a", "b"]}));
    s.insert(&path!("l"), 0, "z").unwrap();
    assert_eq!(s.get(&path!("l", 0)).unwrap(), json!("z"));
    assert_eq!(s.size(&path!("l")), 3);
}

#[test]
fn test_insert_then_destroy_restores_sequence() {
    let s = state(json!({"l": [1, 2, 3]}));
    let before = s.to_json();
    s.insert(&path!("l"), 0, 99).unwrap();
    s.destroy(&path!("l"), 0).unwrap();
    assert_eq!(s.to_json(), before);
    assert_eq!(s.size(&path!("l")), 3);
}

#[test]
fn test_insert_into_empty_sequence_with_negative_index() {
    let s = state(json!({"l": []}));
    s.insert(&path!("l"), -1, "only").unwrap();
    assert_eq!(s.get(&path!("l")).unwrap(), json!(["only"]));
}

#[test]
fn test_insert_on_non_sequence_fails() {
    let s = state(json!({"m": {"a": 1}}));
    let err = s.insert(&path!("m"), 0, 1).unwrap_err();
    assert!(matches!(err, FlatError::TypeMismatch { found: "mapping", .. }));
}

#[test]
fn test_destroy_last_via_negative() {
    let s = state(json!({"items": ["p", "q", "r"]}));
    s.destroy(&path!("items"), -1).unwrap();
    assert_eq!(s.get(&path!("items")).unwrap(), json!(["p", "q"]));
}

#[test]
fn test_destroy_negative_matches_positive() {
    let a = state(json!({"l": [1, 2, 3, 4]}));
    let b = state(json!({"l": [1, 2, 3, 4]}));
    let n = a.size(&path!("l")) as i64;
    let removed_a = a.destroy(&path!("l"), -1).unwrap();
    let removed_b = b.destroy(&path!("l"), n - 1).unwrap();
    assert_eq!(removed_a, removed_b);
    assert_eq!(a.to_json(), b.to_json());
}

#[test]
fn test_destroy_on_missing_fails() {
    let s = FlatState::new();
    let err = s.destroy(&path!("l"), 0).unwrap_err();
    assert!(matches!(err, FlatError::TypeMismatch { found: "missing", .. }));
}

#[test]
fn test_destroy_on_empty_sequence_fails() {
    let s = state(json!({"l": []}));
    let err = s.destroy(&path!("l"), -1).unwrap_err();
    assert!(matches!(err, FlatError::IndexOutOfBounds { len: 0, .. }));
}

// ============================================================================
// pop / size
// ============================================================================

#[test]
fn test_pop_returns_last_and_shrinks() {
    let s = state(json!({"l": ["a", "b", "c"]}));
    assert_eq!(s.pop(&path!("l")).unwrap(), json!("c"));
    assert_eq!(s.get(&path!("l")).unwrap(), json!(["a", "b"]));
}

#[test]
fn test_pop_on_empty_or_missing_is_not_found() {
    let s = state(json!({"l": []}));
    assert_eq!(s.pop(&path!("l")), None);
    assert_eq!(s.pop(&path!("nope")), None);
    assert_eq!(s.pop(&path!("nope", 0, "deeper")), None);
}

#[test]
fn test_size_never_fails() {
    let s = state(json!({"l": [1, 2], "m": {"a": 1}, "p": 3}));
    assert_eq!(s.size(&path!("l")), 2);
    assert_eq!(s.size(&path!("m")), 0);
    assert_eq!(s.size(&path!("p")), 0);
    assert_eq!(s.size(&path!("missing")), 0);
    assert_eq!(s.size(&path!("l", "x")), 0);
    // A mapping root has no sequence length.
    assert_eq!(s.size(&Path::root()), 0);
}

// ============================================================================
// snapshot
// ============================================================================

#[test]
fn test_snapshot_is_live() {
    let s = FlatState::new();
    let snap = s.snapshot();
    s.set(&path!("later"), 1).unwrap();
    assert_eq!(snap, json!({"later": 1}));
}

#[test]
fn test_values_read_out_are_aliases() {
    let s = state(json!({"l": [1]}));
    let list = s.get(&path!("l")).unwrap();
    s.append(&path!("l"), 2).unwrap();
    assert_eq!(list, json!([1, 2]));

    let copy = list.deep_clone();
    s.append(&path!("l"), 3).unwrap();
    assert_eq!(copy, json!([1, 2]));
}

#[test]
fn test_storing_a_value_twice_aliases_it() {
    let s = state(json!({"a": {"n": 1}}));
    let a = s.get(&path!("a")).unwrap();
    s.set(&path!("b"), a).unwrap();
    s.set(&path!("b", "n"), 2).unwrap();
    assert_eq!(s.get(&path!("a", "n")).unwrap(), json!(2));
}
