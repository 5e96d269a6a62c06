// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let start = clock.now();
    let start_ms = clock.epoch_ms();

    clock.advance(Duration::from_secs(90));

    assert_eq!(clock.now().duration_since(start), Duration::from_secs(90));
    assert_eq!(clock.epoch_ms(), start_ms + 90_000);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let clone = clock.clone();
    clock.advance(Duration::from_secs(5));
    assert_eq!(clone.epoch_ms(), clock.epoch_ms());
}

#[test]
fn system_clock_epoch_is_recent() {
    // Anything after 2020-01-01 counts as sane.
    assert!(SystemClock.epoch_ms() > 1_577_836_800_000);
}

#[test]
fn rfc3339_renders_utc() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    assert_eq!(clock.rfc3339(), "2023-11-14T22:13:20Z");
}

#[test]
fn rfc3339_zero_is_epoch() {
    assert_eq!(rfc3339_from_epoch_ms(0), "1970-01-01T00:00:00Z");
}
