// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_core::{EventKind, FakeClock};

#[test]
fn autofills_version_timestamp_and_id() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    let log = EventLog::new(dir.path().join("events.jsonl"), clock);

    log.log(EventRecord::new(EventKind::Enqueue).from_role("oc"))
        .unwrap();

    let records = read_events(log.path());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].v, Some(EVENT_SCHEMA_VERSION));
    assert_eq!(records[0].ts_ms, Some(1_700_000_000_000));
    let id = records[0].event_id.clone().unwrap();
    assert!(id.as_str().starts_with("evt-"));
}

#[test]
fn preserves_explicit_fields() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::new(dir.path().join("events.jsonl"), FakeClock::new());

    let mut record = EventRecord::new(EventKind::Inject);
    record.ts_ms = Some(42);
    record.event_id = Some(EventId::new("evt-fixed001"));
    log.log(record).unwrap();

    let records = read_events(log.path());
    assert_eq!(records[0].ts_ms, Some(42));
    assert_eq!(records[0].event_id, Some(EventId::new("evt-fixed001")));
}

#[test]
fn appends_in_call_order() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let log = EventLog::new(dir.path().join("events.jsonl"), clock.clone());

    for i in 0..5 {
        clock.set_epoch_ms(1000 + i);
        log.log(EventRecord::new(EventKind::Enqueue).count(i)).unwrap();
    }

    let counts: Vec<u64> = read_events(log.path())
        .into_iter()
        .filter_map(|r| r.count)
        .collect();
    assert_eq!(counts, vec![0, 1, 2, 3, 4]);

    let stamps: Vec<u64> = read_events(log.path())
        .into_iter()
        .filter_map(|r| r.ts_ms)
        .collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn clones_share_the_writer() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::new(dir.path().join("events.jsonl"), FakeClock::new());
    let clone = log.clone();

    log.log(EventRecord::new(EventKind::Enqueue)).unwrap();
    clone.log(EventRecord::new(EventKind::Inject)).unwrap();

    assert_eq!(read_events(log.path()).len(), 2);
}

#[test]
fn read_events_skips_garbage_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    std::fs::write(
        &path,
        "{\"type\":\"enqueue\"}\nnot json at all\n{\"type\":\"inject\"}\n",
    )
    .unwrap();
    assert_eq!(read_events(&path).len(), 2);
}
