// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_complete_payload() {
    let payload = r###"{
        "chk_id": "chk-aaaa0000",
        "role": "cc",
        "content": "## Current Goal\nShip it",
        "labels": {"sprint": "7"},
        "title": "cc checkpoint"
    }"###;
    let content = ContentPayload::parse(payload).unwrap();
    assert_eq!(content.chk_id, "chk-aaaa0000");
    assert_eq!(content.role, "cc");
    assert_eq!(content.content, "## Current Goal\nShip it");
    assert_eq!(content.labels.get("sprint").map(String::as_str), Some("7"));
    assert_eq!(content.title.as_deref(), Some("cc checkpoint"));
}

#[yare::parameterized(
    no_chk_id  = { r#"{"role":"cc","content":"x"}"#, "chk_id" },
    no_role    = { r#"{"chk_id":"chk-a","content":"x"}"#, "role" },
    no_content = { r#"{"chk_id":"chk-a","role":"cc"}"#, "content" },
    empty_role = { r#"{"chk_id":"chk-a","role":"  ","content":"x"}"#, "role" },
)]
fn missing_required_field_fails(payload: &str, field: &str) {
    match ContentPayload::parse(payload) {
        Err(CheckpointError::MissingField(f)) => assert_eq!(f, field),
        other => panic!("expected MissingField({field}), got {other:?}"),
    }
}

#[test]
fn invalid_json_fails() {
    assert!(matches!(
        ContentPayload::parse("not json"),
        Err(CheckpointError::Json(_))
    ));
}

#[test]
fn reserved_labels_silently_dropped() {
    let payload = r#"{
        "chk_id": "chk-a",
        "role": "cc",
        "content": "x",
        "labels": {"role": "oc", "chk_id": "chk-b", "source": "me", "confidence": "max", "writer": "me", "kept": "yes"}
    }"#;
    let content = ContentPayload::parse(payload).unwrap();
    assert_eq!(content.labels.len(), 1);
    assert_eq!(content.labels.get("kept").map(String::as_str), Some("yes"));
}

#[test]
fn role_is_normalized() {
    let content = ContentPayload::parse(r#"{"chk_id":"chk-a","role":"CC","content":"x"}"#).unwrap();
    assert_eq!(content.role, "cc");
}
