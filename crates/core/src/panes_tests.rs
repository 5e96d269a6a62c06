// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn parses_versioned_form() {
    let map = PaneMap::parse(
        r#"{"panes":{"oc":"%0","cc":"%1"},"version":4,"registered_at":"2026-03-01T10:00:00Z"}"#,
    )
    .unwrap();
    assert_eq!(map.version, 4);
    assert_eq!(map.resolve(&Role::new("oc")), Some(&PaneId::new("%0")));
    assert_eq!(map.resolve(&Role::new("cc")), Some(&PaneId::new("%1")));
    assert!(map.registered_at_utc().is_some());
}

#[test]
fn parses_legacy_flat_form() {
    let map = PaneMap::parse(r#"{"oc":"%0","admin":"%3"}"#).unwrap();
    assert_eq!(map.version, 0);
    assert_eq!(map.registered_at, None);
    assert_eq!(map.resolve(&Role::new("admin")), Some(&PaneId::new("%3")));
}

#[test]
fn rejects_unknown_shape() {
    assert!(matches!(
        PaneMap::parse(r#"{"oc": 12}"#),
        Err(PaneMapError::UnknownShape)
    ));
    assert!(matches!(
        PaneMap::parse(r#"[1,2]"#),
        Err(PaneMapError::UnknownShape)
    ));
}

#[test]
fn role_keys_are_normalized() {
    let map = PaneMap::parse(r#"{"OC":"%0"}"#).unwrap();
    assert_eq!(map.resolve(&Role::new("oc")), Some(&PaneId::new("%0")));
}

#[yare::parameterized(
    missing_registration = { None, None, true },
    missing_registration_with_recycle = { None, Some("2026-03-01T10:00:00Z"), true },
    registered_no_recycle = { Some("2026-03-01T10:00:00Z"), None, false },
    registered_before_recycle = { Some("2026-03-01T09:00:00Z"), Some("2026-03-01T10:00:00Z"), true },
    registered_after_recycle = { Some("2026-03-01T11:00:00Z"), Some("2026-03-01T10:00:00Z"), false },
    unparseable_registration = { Some("yesterday-ish"), None, true },
)]
fn staleness(registered_at: Option<&str>, last_recycle: Option<&str>, stale: bool) {
    let map = PaneMap {
        panes: Default::default(),
        version: 1,
        registered_at: registered_at.map(String::from),
    };
    let recycle = last_recycle.map(|s| {
        chrono::DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&Utc)
    });
    assert_eq!(map.is_stale(recycle), stale);
}

#[test]
fn fallback_default_covers_four_panes() {
    let map = PaneMap::fallback_default();
    assert_eq!(map.panes.len(), 4);
    assert_eq!(map.resolve(&Role::new("admin")), Some(&PaneId::new("%3")));
    assert!(map.is_stale(Some(Utc.timestamp_opt(0, 0).unwrap())));
}

#[test]
fn serializes_versioned_form() {
    let map = PaneMap::parse(r#"{"oc":"%0"}"#).unwrap();
    let json = serde_json::to_value(&map).unwrap();
    assert_eq!(json["panes"]["oc"], "%0");
    assert_eq!(json["version"], 0);
}
