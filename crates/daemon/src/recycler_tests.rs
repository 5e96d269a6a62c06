// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::idle::IdleDetector;
use crate::session_map::SessionMapService;
use crate::test_support::{wait_for, Harness};
use relay_adapters::MuxCall;
use relay_core::EventKind;
use relay_storage::save_pane_map;
use std::time::Duration;

type TestTimer = AdminTimer<
    relay_adapters::FakeMuxAdapter,
    relay_adapters::FakeBeadStore,
    relay_adapters::FakeSummarizer,
    relay_core::FakeClock,
>;

fn timer(h: &Harness) -> TestTimer {
    timer_with(h, PaneMap::fallback_default())
}

fn timer_with(h: &Harness, map: PaneMap) -> TestTimer {
    let session_map = SessionMapService::new(
        Arc::clone(&h.config),
        h.admin.clone(),
        h.mux.clone(),
        h.clock.clone(),
    );
    let idle = IdleDetector::new(
        h.config.worktrees.clone(),
        h.config.idle_backstop_interval,
        h.clock.clone(),
    );
    AdminTimer::new(AdminTimerDeps {
        injector: h.injector.clone(),
        sender: h.sender.clone(),
        admin: h.admin.clone(),
        session_map,
        events: h.events.clone(),
        clock: h.clock.clone(),
        config: Arc::clone(&h.config),
        pane_map: Arc::new(RwLock::new(map)),
        pane_map_path: h.dir.path().join("state/panes.json"),
        last_life_path: h.dir.path().join("state/last-life.txt"),
        idle,
    })
}

#[test]
fn allowlisted_commands_enqueue() {
    let h = Harness::new();
    let timer = timer(&h);

    assert!(timer.inject_admin_command("/health-check"));
    assert_eq!(h.injector.queue_len(&Role::new(ADMIN)), 1);
    assert!(h.event_kinds().contains(&EventKind::Enqueue));
}

#[test]
fn unknown_admin_commands_rejected() {
    let h = Harness::new();
    let timer = timer(&h);

    assert!(!timer.inject_admin_command("/rm-rf"));
    assert_eq!(h.injector.queue_len(&Role::new(ADMIN)), 0);

    let rejected = h
        .events()
        .into_iter()
        .find(|r| r.kind == EventKind::AdminCommandRejected)
        .expect("rejection event");
    assert_eq!(rejected.status.as_deref(), Some("/rm-rf"));
}

#[tokio::test(start_paused = true)]
async fn recycle_runs_capture_exit_prompt_relaunch() {
    let h = Harness::with_config(|config| {
        config.admin_relaunch_cmd = Some("claude --resume".into());
    });
    h.mux.set_tail("%3", "❯ ");
    let timer = timer(&h);

    timer.recycle().await;

    let calls = h.mux.calls();

    // Tail captured for last-life before anything else touches the pane.
    let capture_idx = calls
        .iter()
        .position(|c| matches!(c, MuxCall::CaptureTail { pane, lines } if pane == "%3" && *lines == 200))
        .expect("last-life capture");
    let exit_idx = calls
        .iter()
        .position(|c| matches!(c, MuxCall::Paste { pane, text, .. } if pane == "%3" && text == "/exit"))
        .expect("exit injection");
    let relaunch_idx = calls
        .iter()
        .position(|c| matches!(c, MuxCall::Paste { pane, text, .. } if pane == "%3" && text == "claude --resume"))
        .expect("relaunch injection");
    assert!(capture_idx < exit_idx);
    assert!(exit_idx < relaunch_idx);

    // last-life written, completion recorded.
    let last_life = std::fs::read_to_string(h.dir.path().join("state/last-life.txt")).unwrap();
    assert!(last_life.contains("❯"));
    assert!(h.event_kinds().contains(&EventKind::AdminRecycleComplete));

    // Session map rediscovery persisted a fresh map file.
    assert!(h
        .dir
        .path()
        .join("state/session-map-pod.json")
        .exists());
}

#[tokio::test(start_paused = true)]
async fn recycle_proceeds_when_prompt_never_returns() {
    let h = Harness::with_config(|config| {
        config.admin_relaunch_cmd = Some("claude --resume".into());
    });
    h.mux.set_tail("%3", "still shutting down...");
    let timer = timer(&h);

    timer.recycle().await;

    assert!(h
        .mux
        .sent_texts("%3")
        .iter()
        .any(|t| t == "claude --resume"));
    assert!(h.event_kinds().contains(&EventKind::AdminRecycleComplete));
}

#[tokio::test(start_paused = true)]
async fn stale_pane_map_triggers_reregistration() {
    let h = Harness::new();

    // On-disk map is fresh; in-memory map has no registration time.
    let mut fresh = PaneMap::fallback_default();
    fresh.version = 7;
    fresh.registered_at = Some("2026-03-01T12:00:00Z".into());
    save_pane_map(&h.dir.path().join("state/panes.json"), &fresh).unwrap();

    let stale = PaneMap::fallback_default();
    assert!(stale.registered_at.is_none());
    let timer = timer_with(&h, stale);

    timer.refresh_pane_map_if_stale().await;

    // /register-panes was enqueued for the admin pane.
    assert_eq!(h.injector.queue_len(&Role::new(ADMIN)), 1);
    // The reloaded map reached the injector and the event log.
    wait_for(|| {
        h.events()
            .iter()
            .any(|r| r.kind == EventKind::PaneMapReloaded && r.count == Some(7))
    })
    .await;

    // A second call is a no-op until the next staleness detection.
    timer.refresh_pane_map_if_stale().await;
    assert_eq!(h.injector.queue_len(&Role::new(ADMIN)), 1);
}

#[tokio::test(start_paused = true)]
async fn fresh_pane_map_is_left_alone() {
    let h = Harness::new();
    let mut fresh = PaneMap::fallback_default();
    fresh.registered_at = Some("2026-03-01T12:00:00Z".into());
    let timer = timer_with(&h, fresh);

    timer.refresh_pane_map_if_stale().await;
    assert_eq!(h.injector.queue_len(&Role::new(ADMIN)), 0);
}

#[tokio::test(start_paused = true)]
async fn cycle_tick_recycles_at_threshold() {
    let h = Harness::with_config(|config| {
        config.admin_recycle_cycles = 2;
        config.admin_relaunch_cmd = Some("claude".into());
    });
    h.mux.set_tail("%3", "❯ ");
    // Keep the pane map fresh so staleness repair stays quiet.
    let mut fresh = PaneMap::fallback_default();
    fresh.registered_at = Some("2026-03-01T12:00:00Z".into());
    let timer = timer_with(&h, fresh);

    timer.cycle_tick().await;
    assert!(!h.event_kinds().contains(&EventKind::AdminRecycleComplete));

    timer.cycle_tick().await;
    assert!(h.event_kinds().contains(&EventKind::AdminRecycleComplete));
}

#[tokio::test(start_paused = true)]
async fn deadman_fires_after_silence() {
    let h = Harness::with_config(|config| {
        config.deadman_threshold = Some(Duration::from_secs(60));
    });
    let timer = timer(&h);

    // No pane mapped: every injection fails, so nothing refreshes the
    // activity stamp and the silence clock runs from startup.
    h.injector.update_targets(indexmap::IndexMap::new());
    h.clock.advance(Duration::from_secs(120));
    timer.health_tick().await;

    let deadman = h
        .events()
        .into_iter()
        .find(|r| r.kind == EventKind::AdminDeadman)
        .expect("deadman event");
    assert!(deadman.error.unwrap_or_default().contains("silent"));
}

#[yare::parameterized(
    seconds      = { 45_000, "45s" },
    minutes      = { 150_000, "2m" },
    exact_hours  = { 7_200_000, "2h" },
    hours_padded = { 3_900_000, "1h05m" },
)]
fn silence_label_scales(ms: u64, expected: &str) {
    assert_eq!(silence_label(ms), expected);
}

#[tokio::test(start_paused = true)]
async fn health_tick_without_threshold_never_deadmans() {
    let h = Harness::new();
    let timer = timer(&h);

    h.clock.advance(Duration::from_secs(24 * 3600));
    timer.health_tick().await;

    assert!(!h.event_kinds().contains(&EventKind::AdminDeadman));
    assert!(h.event_kinds().contains(&EventKind::Enqueue));
}
