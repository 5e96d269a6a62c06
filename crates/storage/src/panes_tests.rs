// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_core::{PaneId, Role};

#[test]
fn save_then_load_round_trips_versioned_form() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("panes.json");

    let mut map = PaneMap::fallback_default();
    map.version = 3;
    map.registered_at = Some("2026-03-01T10:00:00Z".into());
    save_pane_map(&path, &map).unwrap();

    let loaded = load_pane_map(&path).unwrap();
    assert_eq!(loaded, map);
}

#[test]
fn loads_legacy_flat_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("panes.json");
    std::fs::write(&path, r#"{"oc":"%0","cc":"%1","cx":"%2","admin":"%3"}"#).unwrap();

    let map = load_pane_map(&path).unwrap();
    assert_eq!(map.resolve(&Role::new("cx")), Some(&PaneId::new("%2")));
    assert_eq!(map.version, 0);
}

#[test]
fn missing_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_pane_map(&dir.path().join("panes.json")).is_err());
}
