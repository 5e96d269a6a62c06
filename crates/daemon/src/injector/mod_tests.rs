// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{envelope, wait_for, Harness};
use relay_core::{EventKind, Kind};
use std::time::Duration as StdDuration;

#[test]
fn inject_enqueues_and_logs() {
    let h = Harness::new();
    let env = envelope("oc", "cc", Kind::Chat, "hi");

    h.injector.inject(env).unwrap();

    assert_eq!(h.injector.queue_len(&Role::new("cc")), 1);
    assert_eq!(h.event_kinds(), vec![EventKind::Enqueue]);
}

#[test]
fn inject_rejects_unknown_target() {
    let h = Harness::new();

    let err = h
        .injector
        .inject(envelope("oc", "ghost", Kind::Chat, "hi"))
        .unwrap_err();
    assert!(matches!(err, InjectError::UnknownTarget(_)));

    // `vog` is an allowed role but has no pane in the default map.
    let err = h
        .injector
        .inject(envelope("oc", "vog", Kind::Chat, "hi"))
        .unwrap_err();
    assert!(matches!(err, InjectError::UnknownTarget(_)));

    assert_eq!(
        h.event_kinds(),
        vec![EventKind::UnknownTarget, EventKind::UnknownTarget]
    );
}

#[test]
fn inject_rejects_unexpanded_broadcast() {
    let h = Harness::new();
    let err = h
        .injector
        .inject(envelope("oc", "all", Kind::Chat, "hi"))
        .unwrap_err();
    assert!(matches!(err, InjectError::BroadcastNotExpanded));
}

#[test]
fn inject_rejects_invalid_envelope() {
    let h = Harness::new();
    let mut env = envelope("oc", "cc", Kind::Chat, "hi");
    env.msg_id = relay_core::MsgId::new("");
    assert!(matches!(
        h.injector.inject(env),
        Err(InjectError::Invalid(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn delivers_fifo_per_pane() {
    let h = Harness::new();
    let (_handle, shutdown) = crate::lifecycle::Shutdown::new();
    let (fatal_tx, _fatal_rx) = tokio::sync::mpsc::channel(8);
    h.injector.start(&shutdown, fatal_tx);

    h.injector
        .inject(envelope("oc", "cc", Kind::Chat, "first"))
        .unwrap();
    h.injector
        .inject(envelope("oc", "cc", Kind::Chat, "second"))
        .unwrap();

    wait_for(|| h.mux.sent_texts("%1").len() == 2).await;

    let sent = h.mux.sent_texts("%1");
    assert!(sent[0].contains("first"));
    assert!(sent[1].contains("second"));

    // The event log agrees on the order.
    let injected: Vec<_> = h
        .events()
        .into_iter()
        .filter(|r| r.kind == EventKind::Inject)
        .collect();
    assert_eq!(injected.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn wraps_payload_with_relay_frame() {
    let h = Harness::new();
    let (_handle, shutdown) = crate::lifecycle::Shutdown::new();
    let (fatal_tx, _fatal_rx) = tokio::sync::mpsc::channel(8);
    h.injector.start(&shutdown, fatal_tx);

    h.injector
        .inject(envelope("oc", "cc", Kind::Chat, "A <b> & c"))
        .unwrap();
    wait_for(|| !h.mux.sent_texts("%1").is_empty()).await;

    let sent = h.mux.sent_texts("%1");
    assert!(sent[0].starts_with("<relay-message from=\"oc\" to=\"cc\" kind=\"chat\">"));
    assert!(sent[0].contains("[Relay from oc. Not from the human user.]"));
    assert!(sent[0].contains("A &lt;b> &amp; c"));
    assert!(sent[0].ends_with("</relay-message>"));
}

#[tokio::test(start_paused = true)]
async fn slash_commands_bypass_gate_and_wrap() {
    let h = Harness::new();
    // Pane is busy; a slash command must go through anyway.
    h.mux.set_tail("%1", "   Compiling relay v0.1.0");
    let (_handle, shutdown) = crate::lifecycle::Shutdown::new();
    let (fatal_tx, _fatal_rx) = tokio::sync::mpsc::channel(8);
    h.injector.start(&shutdown, fatal_tx);

    h.injector
        .inject(envelope("oc", "cc", Kind::Command, "  /compact  "))
        .unwrap();
    wait_for(|| !h.mux.sent_texts("%1").is_empty()).await;

    assert_eq!(h.mux.sent_texts("%1"), vec!["/compact".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn blocked_pane_requeues_then_delivers() {
    let h = Harness::new();
    h.mux.set_tail("%1", "   Compiling relay v0.1.0");
    let (_handle, shutdown) = crate::lifecycle::Shutdown::new();
    let (fatal_tx, _fatal_rx) = tokio::sync::mpsc::channel(8);
    h.injector.start(&shutdown, fatal_tx);

    h.injector
        .inject(envelope("oc", "cc", Kind::Chat, "patient"))
        .unwrap();

    wait_for(|| h.event_kinds().contains(&EventKind::Blocked)).await;
    assert!(h.mux.sent_texts("%1").is_empty());

    // Prompt comes back; the retry loop picks the head up again.
    h.mux.set_tail("%1", "❯ ");
    wait_for(|| !h.mux.sent_texts("%1").is_empty()).await;
    assert!(h.mux.sent_texts("%1")[0].contains("patient"));
}

#[tokio::test(start_paused = true)]
async fn blocked_event_carries_tail_snippet() {
    let h = Harness::new();
    h.mux.set_tail("%1", "deep in thought\nstill thinking");
    let (_handle, shutdown) = crate::lifecycle::Shutdown::new();
    let (fatal_tx, _fatal_rx) = tokio::sync::mpsc::channel(8);
    h.injector.start(&shutdown, fatal_tx);

    h.injector
        .inject(envelope("oc", "cc", Kind::Chat, "x"))
        .unwrap();
    wait_for(|| h.event_kinds().contains(&EventKind::Blocked)).await;

    let blocked = h
        .events()
        .into_iter()
        .find(|r| r.kind == EventKind::Blocked)
        .unwrap();
    assert!(blocked.status.unwrap_or_default().contains("still thinking"));
}

#[tokio::test(start_paused = true)]
async fn over_age_messages_drop() {
    let h = Harness::new();
    let (_handle, shutdown) = crate::lifecycle::Shutdown::new();

    h.injector
        .inject(envelope("oc", "cc", Kind::Chat, "stale"))
        .unwrap();
    // Older than the 5 minute queue-max-age before the worker starts.
    h.clock.advance(StdDuration::from_secs(6 * 60));

    let (fatal_tx, _fatal_rx) = tokio::sync::mpsc::channel(8);
    h.injector.start(&shutdown, fatal_tx);

    wait_for(|| h.event_kinds().contains(&EventKind::Drop)).await;
    assert!(h.mux.sent_texts("%1").is_empty());
    assert_eq!(h.injector.queue_len(&Role::new("cc")), 0);
}

#[test]
fn snippet_flattens_and_truncates() {
    let long = "x".repeat(500);
    let snip = snippet(&format!("line one\n{long}"));
    assert!(snip.contains("line one ⏎ "));
    assert!(snip.chars().count() <= TAIL_SNIPPET_CHARS + 1);
}
