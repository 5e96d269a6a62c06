// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal multiplexer adapters
//!
//! The daemon drives the multiplexer through an opaque command subset
//! (`send-keys`, `load-buffer`, `paste-buffer`, `display-message`,
//! `capture-pane`, `resize-pane`, `list-panes`) and must not assume a
//! specific tool beyond that.

mod send;
mod tmux;

pub use send::{PaneSender, SendOptions};
pub use tmux::TmuxAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMuxAdapter, MuxCall};

use async_trait::async_trait;
use relay_core::PaneId;
use thiserror::Error;

/// Errors from multiplexer operations
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("pane not found: {0}")]
    NotFound(String),
    #[error("mux command failed: {0}")]
    CommandFailed(String),
}

/// Adapter for driving terminal-multiplexer panes.
#[async_trait]
pub trait MuxAdapter: Clone + Send + Sync + 'static {
    /// Send literal text to a pane (no key-name interpretation).
    async fn send_literal(&self, pane: &PaneId, text: &str) -> Result<(), MuxError>;

    /// Send a named key (`Enter`, `Escape`) to a pane.
    async fn send_key(&self, pane: &PaneId, key: &str) -> Result<(), MuxError>;

    /// Stage text in a named buffer and paste it into a pane.
    async fn paste(&self, pane: &PaneId, buffer: &str, text: &str) -> Result<(), MuxError>;

    /// Capture the last `lines` lines of a pane.
    async fn capture_tail(&self, pane: &PaneId, lines: u32) -> Result<String, MuxError>;

    /// Expand a display-message format string for a pane (e.g. `#{pane_mode}`).
    async fn display(&self, pane: &PaneId, format: &str) -> Result<String, MuxError>;

    /// Nudge a pane with a shrink/grow resize pulse (SIGWINCH wake).
    async fn resize_pulse(&self, pane: &PaneId) -> Result<(), MuxError>;

    /// List pane ids of a session.
    async fn list_panes(&self, session: &str) -> Result<Vec<PaneId>, MuxError>;

    /// Number of clients attached to a session.
    async fn attached_clients(&self, session: &str) -> Result<u32, MuxError>;
}
