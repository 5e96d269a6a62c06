// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn spec() -> BeadSpec {
    BeadSpec {
        bead_type: BeadType::Recovery,
        title: "cc checkpoint".into(),
        labels: vec![
            ("role".into(), "cc".into()),
            ("chk_id".into(), "chk-aaaa0000".into()),
        ],
        body: "## Current Goal\nShip".into(),
    }
}

#[test]
fn create_args_layout() {
    let args = create_args(&spec());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    assert_eq!(
        args,
        vec![
            "create",
            "--type",
            "recovery",
            "--title",
            "cc checkpoint",
            "--label",
            "role:cc",
            "--label",
            "chk_id:chk-aaaa0000",
            "--body",
            "## Current Goal\nShip",
        ]
    );
}

#[test]
fn list_args_layout() {
    let query = BeadQuery {
        labels: vec![("role".into(), "cc".into())],
        status: Some("open".into()),
        created_after: Some("2026-01-01T00:00:00Z".into()),
        limit: 3,
    };
    let args = list_args(BeadType::Recovery, &query);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    assert_eq!(
        args,
        vec![
            "list",
            "--type",
            "recovery",
            "--label",
            "role:cc",
            "--limit",
            "3",
            "--status",
            "open",
            "--created-after",
            "2026-01-01T00:00:00Z",
            "--json",
        ]
    );
}

#[test]
fn show_args_layout() {
    let raw_args = show_args("bd-7", true);
    let raw: Vec<&str> = raw_args.iter().map(String::as_str).collect();
    assert_eq!(raw, vec!["show", "bd-7", "--body"]);

    // Empty raw body falls back to the human-formatted form.
    let plain_args = show_args("bd-7", false);
    let plain: Vec<&str> = plain_args.iter().map(String::as_str).collect();
    assert_eq!(plain, vec!["show", "bd-7"]);
}

#[test]
fn list_args_limit_floor_is_one() {
    let args = list_args(BeadType::ChunkSummary, &BeadQuery::default());
    let limit_pos = args.iter().position(|a| a == "--limit").unwrap();
    assert_eq!(args[limit_pos + 1], "1");
}

#[test]
fn db_flag_prepended_when_configured() {
    let cli = BdCli::with_db("/tmp/beads.db".into());
    let base: Vec<String> = cli.base_args();
    assert_eq!(base, vec!["--db".to_string(), "/tmp/beads.db".to_string()]);
    assert!(BdCli::new().base_args().is_empty());
}

#[yare::parameterized(
    plain_id      = { r#"{"id":"bd-1","status":"open"}"#, "bd-1" },
    bead_id       = { r#"{"bead_id":"bd-2"}"#, "bd-2" },
    checkpoint_id = { r#"{"checkpoint_id":"bd-3"}"#, "bd-3" },
    chk_id        = { r#"{"chk_id":"chk-4"}"#, "chk-4" },
)]
fn list_item_accepts_id_spellings(json: &str, expected: &str) {
    let value: serde_json::Value = serde_json::from_str(json).unwrap();
    let item = BeadListItem::parse(&value).unwrap();
    assert_eq!(item.id, expected);
}

#[test]
fn list_item_without_id_is_skipped() {
    let value: serde_json::Value = serde_json::from_str(r#"{"status":"open"}"#).unwrap();
    assert!(BeadListItem::parse(&value).is_none());
}

#[test]
fn list_item_labels_and_lookup() {
    let value: serde_json::Value = serde_json::from_str(
        r#"{"id":"bd-1","created_at":"2026-01-01T00:00:00Z","labels":["role:cc","source:agent"]}"#,
    )
    .unwrap();
    let item = BeadListItem::parse(&value).unwrap();
    assert!(item.has_label("role", "cc"));
    assert!(item.has_label("source", "agent"));
    assert!(!item.has_label("role", "oc"));
    assert_eq!(item.created_at.as_deref(), Some("2026-01-01T00:00:00Z"));
}
