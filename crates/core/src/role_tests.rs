// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    lowercase  = { "cc", "cc" },
    uppercase  = { "CC", "cc" },
    padded     = { "  Admin ", "admin" },
)]
fn normalized_lowercases_and_trims(input: &str, expected: &str) {
    assert_eq!(Role::normalized(input), expected);
}

#[test]
fn admin_detection() {
    assert!(Role::new("admin").is_admin());
    assert!(!Role::new("oc").is_admin());
}

#[yare::parameterized(
    role      = { "cc", Target::Role(Role::new("cc")) },
    all       = { "all", Target::All },
    all_caps  = { "ALL", Target::All },
)]
fn target_parse(input: &str, expected: Target) {
    assert_eq!(Target::parse(input), expected);
}

#[test]
fn target_serde_round_trip() {
    let all: Target = serde_json::from_str("\"all\"").unwrap();
    assert_eq!(all, Target::All);
    assert_eq!(serde_json::to_string(&all).unwrap(), "\"all\"");

    let role: Target = serde_json::from_str("\"cx\"").unwrap();
    assert_eq!(role, Target::Role(Role::new("cx")));
    assert_eq!(serde_json::to_string(&role).unwrap(), "\"cx\"");
}
