// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn missing_file_is_default_state() {
    let dir = tempfile::tempdir().unwrap();
    let state = AdminState::load(&dir.path().join("admin-state.json"));
    assert_eq!(state, AdminState::default());
}

#[test]
fn save_and_reload_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("admin-state.json");

    let mut state = AdminState::default();
    state.last_relay_activity_ms = 1_700_000_000_000;
    state.last_log_growth_ms.insert("cc".into(), 1_700_000_001_000);
    state
        .last_checkpoint_time_ms
        .insert("cc".into(), 1_700_000_002_000);
    state.cooldown_until_ms.insert("oc".into(), 1_700_000_003_000);
    state.save(&path).unwrap();

    assert_eq!(AdminState::load(&path), state);
}

#[test]
fn corrupt_file_is_default_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("admin-state.json");
    std::fs::write(&path, "][").unwrap();
    assert_eq!(AdminState::load(&path), AdminState::default());
}

#[test]
fn metrics_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("admin-metrics.json");

    let metrics = AdminMetrics {
        checkpoint_requests: 4,
        checkpoint_acks: 3,
        checkpoint_timeouts: 1,
        autogen_runs: 1,
        beads_written: 4,
        bead_failures: 0,
        health_checks: 12,
        recycles: 2,
    };
    metrics.save(&path).unwrap();
    assert_eq!(AdminMetrics::load(&path), metrics);
}

#[test]
fn partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("admin-state.json");
    std::fs::write(&path, r#"{"last_relay_activity_ms": 5}"#).unwrap();
    let state = AdminState::load(&path);
    assert_eq!(state.last_relay_activity_ms, 5);
    assert!(state.last_log_growth_ms.is_empty());
}
