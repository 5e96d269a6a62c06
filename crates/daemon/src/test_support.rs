// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for daemon tests
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::admin::AdminCoordinator;
use crate::injector::Injector;
use relay_adapters::{FakeBeadStore, FakeMuxAdapter, FakeSummarizer, PaneSender, SendOptions};
use relay_core::{
    Envelope, EventRecord, FakeClock, Kind, MsgId, PaneMap, RelayConfig, Role, Target,
};
use relay_storage::{read_events, EventLog};
use std::sync::Arc;
use std::time::Duration;

type TestInjector = Injector<FakeMuxAdapter, FakeClock>;
type TestAdmin = AdminCoordinator<FakeMuxAdapter, FakeBeadStore, FakeSummarizer, FakeClock>;

/// Everything a daemon test needs, rooted in one temp dir.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub config: Arc<RelayConfig>,
    pub clock: FakeClock,
    pub mux: FakeMuxAdapter,
    pub beads: FakeBeadStore,
    pub summarizer: FakeSummarizer,
    pub sender: PaneSender<FakeMuxAdapter>,
    pub events: EventLog<FakeClock>,
    pub injector: TestInjector,
    pub admin: TestAdmin,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(|_| {}, false)
    }

    /// Harness with a configured LLM summarizer fake.
    pub fn with_llm() -> Self {
        Self::build(|_| {}, true)
    }

    pub fn with_config(mutate: impl FnOnce(&mut RelayConfig)) -> Self {
        Self::build(mutate, false)
    }

    fn build(mutate: impl FnOnce(&mut RelayConfig), with_llm: bool) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = RelayConfig::for_test(dir.path());
        mutate(&mut config);
        let config = Arc::new(config);

        let clock = FakeClock::new();
        clock.set_epoch_ms(1_700_000_000_000);

        let mux = FakeMuxAdapter::new();
        for pane in ["%0", "%1", "%2", "%3"] {
            mux.set_tail(pane, "❯ ");
        }

        let sender = PaneSender::new(
            mux.clone(),
            SendOptions {
                session: config.tmux_session.clone(),
                vim_mode: false,
                echo_wait: Duration::from_millis(1),
                enter_retry: Duration::from_millis(1),
            },
        );
        let events = EventLog::new(dir.path().join("log/events.jsonl"), clock.clone());

        let injector = Injector::new(
            &config.roles,
            PaneMap::fallback_default().panes,
            sender.clone(),
            events.clone(),
            clock.clone(),
            config.prompt_gating,
            config.queue_max_age,
        );

        let beads = FakeBeadStore::new();
        let summarizer = FakeSummarizer::new();
        let admin = AdminCoordinator::new(
            injector.clone(),
            beads.clone(),
            with_llm.then(|| summarizer.clone()),
            events.clone(),
            clock.clone(),
            Arc::clone(&config),
            dir.path().join("state/admin-state.json"),
            dir.path().join("state/admin-metrics.json"),
        );

        Self {
            dir,
            config,
            clock,
            mux,
            beads,
            summarizer,
            sender,
            events,
            injector,
            admin,
        }
    }

    pub fn events(&self) -> Vec<EventRecord> {
        read_events(self.events.path())
    }

    pub fn event_kinds(&self) -> Vec<relay_core::EventKind> {
        self.events().into_iter().map(|r| r.kind).collect()
    }
}

/// A complete envelope for tests.
pub fn envelope(from: &str, to: &str, kind: Kind, payload: &str) -> Envelope {
    Envelope {
        msg_id: MsgId::generate(),
        ts: "2026-03-01T10:00:00Z".into(),
        project_id: None,
        from: Role::new(from),
        to: Target::parse(to),
        kind,
        priority: 1,
        thread_id: None,
        payload: payload.into(),
        ephemeral: false,
    }
}

/// Poll until `check` passes or two (virtual) seconds elapse.
pub async fn wait_for(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never became true");
}
