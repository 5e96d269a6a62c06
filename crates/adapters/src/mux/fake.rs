// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake multiplexer adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MuxAdapter, MuxError};
use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::PaneId;
use std::collections::HashMap;
use std::sync::Arc;

/// Recorded multiplexer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxCall {
    SendLiteral { pane: String, text: String },
    SendKey { pane: String, key: String },
    Paste { pane: String, buffer: String, text: String },
    CaptureTail { pane: String, lines: u32 },
    Display { pane: String, format: String },
    ResizePulse { pane: String },
    ListPanes { session: String },
    AttachedClients { session: String },
}

#[derive(Default)]
struct FakePane {
    tail: String,
    mode: String,
    fail_sends: bool,
    fail_keys: bool,
}

#[derive(Default)]
struct FakeMuxState {
    panes: HashMap<String, FakePane>,
    calls: Vec<MuxCall>,
    attached: u32,
    pane_list: Vec<PaneId>,
}

/// Fake multiplexer adapter for testing
#[derive(Clone)]
pub struct FakeMuxAdapter {
    inner: Arc<Mutex<FakeMuxState>>,
}

impl Default for FakeMuxAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeMuxState {
                attached: 1,
                ..Default::default()
            })),
        }
    }
}

impl FakeMuxAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<MuxCall> {
        self.inner.lock().calls.clone()
    }

    /// Text payloads delivered to a pane, in order (paste or literal).
    pub fn sent_texts(&self, pane: &str) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MuxCall::Paste { pane: p, text, .. } if p == pane => Some(text.clone()),
                MuxCall::SendLiteral { pane: p, text } if p == pane => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Set the tail returned from `capture_tail` for a pane.
    pub fn set_tail(&self, pane: &str, tail: &str) {
        self.inner.lock().panes.entry(pane.to_string()).or_default().tail = tail.to_string();
    }

    /// Set the `#{pane_mode}` answer for a pane.
    pub fn set_mode(&self, pane: &str, mode: &str) {
        self.inner.lock().panes.entry(pane.to_string()).or_default().mode = mode.to_string();
    }

    /// Make every send/paste to a pane fail.
    pub fn set_fail_sends(&self, pane: &str, fail: bool) {
        self.inner
            .lock()
            .panes
            .entry(pane.to_string())
            .or_default()
            .fail_sends = fail;
    }

    /// Make only named-key sends to a pane fail (paste still works).
    pub fn set_fail_keys(&self, pane: &str, fail: bool) {
        self.inner
            .lock()
            .panes
            .entry(pane.to_string())
            .or_default()
            .fail_keys = fail;
    }

    pub fn set_attached_clients(&self, count: u32) {
        self.inner.lock().attached = count;
    }

    pub fn set_pane_list(&self, panes: &[&str]) {
        self.inner.lock().pane_list = panes.iter().map(|p| PaneId::new(*p)).collect();
    }
}

impl FakeMuxAdapter {
    fn record(&self, call: MuxCall) {
        self.inner.lock().calls.push(call);
    }

    fn should_fail(&self, pane: &str) -> bool {
        self.inner
            .lock()
            .panes
            .get(pane)
            .is_some_and(|p| p.fail_sends)
    }
}

#[async_trait]
impl MuxAdapter for FakeMuxAdapter {
    async fn send_literal(&self, pane: &PaneId, text: &str) -> Result<(), MuxError> {
        self.record(MuxCall::SendLiteral {
            pane: pane.as_str().to_string(),
            text: text.to_string(),
        });
        if self.should_fail(pane.as_str()) {
            return Err(MuxError::CommandFailed("fake send failure".into()));
        }
        Ok(())
    }

    async fn send_key(&self, pane: &PaneId, key: &str) -> Result<(), MuxError> {
        self.record(MuxCall::SendKey {
            pane: pane.as_str().to_string(),
            key: key.to_string(),
        });
        let inner = self.inner.lock();
        let failing = inner
            .panes
            .get(pane.as_str())
            .is_some_and(|p| p.fail_sends || p.fail_keys);
        if failing {
            return Err(MuxError::CommandFailed("fake send failure".into()));
        }
        Ok(())
    }

    async fn paste(&self, pane: &PaneId, buffer: &str, text: &str) -> Result<(), MuxError> {
        self.record(MuxCall::Paste {
            pane: pane.as_str().to_string(),
            buffer: buffer.to_string(),
            text: text.to_string(),
        });
        if self.should_fail(pane.as_str()) {
            return Err(MuxError::CommandFailed("fake send failure".into()));
        }
        Ok(())
    }

    async fn capture_tail(&self, pane: &PaneId, lines: u32) -> Result<String, MuxError> {
        self.record(MuxCall::CaptureTail {
            pane: pane.as_str().to_string(),
            lines,
        });
        let inner = self.inner.lock();
        match inner.panes.get(pane.as_str()) {
            Some(p) => Ok(p.tail.clone()),
            None => Err(MuxError::NotFound(pane.as_str().to_string())),
        }
    }

    async fn display(&self, pane: &PaneId, format: &str) -> Result<String, MuxError> {
        self.record(MuxCall::Display {
            pane: pane.as_str().to_string(),
            format: format.to_string(),
        });
        let inner = self.inner.lock();
        match inner.panes.get(pane.as_str()) {
            Some(p) => Ok(p.mode.clone()),
            None => Ok(String::new()),
        }
    }

    async fn resize_pulse(&self, pane: &PaneId) -> Result<(), MuxError> {
        self.record(MuxCall::ResizePulse {
            pane: pane.as_str().to_string(),
        });
        Ok(())
    }

    async fn list_panes(&self, session: &str) -> Result<Vec<PaneId>, MuxError> {
        self.record(MuxCall::ListPanes {
            session: session.to_string(),
        });
        Ok(self.inner.lock().pane_list.clone())
    }

    async fn attached_clients(&self, session: &str) -> Result<u32, MuxError> {
        self.record(MuxCall::AttachedClients {
            session: session.to_string(),
        });
        Ok(self.inner.lock().attached)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
