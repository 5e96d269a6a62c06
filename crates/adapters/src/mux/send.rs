// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One send-to-pane operation, serialized per pane
//!
//! Concurrent writers to the same pane interleave keystrokes; a per-pane
//! async mutex makes each paste/commit sequence atomic from the pane's
//! point of view.

use super::{MuxAdapter, MuxError};
use parking_lot::Mutex;
use relay_core::PaneId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const ENTER_ATTEMPTS: u32 = 3;

/// Tunables for the send sequence.
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Session name used for the attached-client check.
    pub session: String,
    /// Emit `Escape` before `Enter` (panes running vim-style line editors).
    pub vim_mode: bool,
    /// Wait for terminal echo after pasting.
    pub echo_wait: Duration,
    /// Spacing between Enter retries.
    pub enter_retry: Duration,
}

impl SendOptions {
    pub fn new(session: impl Into<String>, vim_mode: bool) -> Self {
        Self {
            session: session.into(),
            vim_mode,
            echo_wait: crate::env::echo_wait_ms(),
            enter_retry: crate::env::enter_retry_ms(),
        }
    }
}

/// Serializes send-to-pane sequences under one async mutex per pane id.
#[derive(Clone)]
pub struct PaneSender<M> {
    mux: M,
    options: SendOptions,
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl<M: MuxAdapter> PaneSender<M> {
    pub fn new(mux: M, options: SendOptions) -> Self {
        Self {
            mux,
            options,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn mux(&self) -> &M {
        &self.mux
    }

    fn lock_for(&self, pane: &PaneId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(pane.as_str().to_string()).or_default())
    }

    /// Deliver `text` to `pane` and commit it with Enter.
    ///
    /// Sequence: wake a client-less session with a resize pulse, stage the
    /// payload in a named paste buffer (falling back to literal keystrokes),
    /// wait for terminal echo, optionally leave vim insert mode, then press
    /// Enter with bounded retries.
    pub async fn send_message(&self, pane: &PaneId, text: &str) -> Result<(), MuxError> {
        let lock = self.lock_for(pane);
        let _guard = lock.lock().await;

        if let Ok(0) = self.mux.attached_clients(&self.options.session).await {
            // Headless session: panes may be suspended until a SIGWINCH.
            if let Err(e) = self.mux.resize_pulse(pane).await {
                tracing::debug!(pane = %pane, error = %e, "resize pulse failed");
            }
        }

        let buffer = format!("relay-{}", pane.as_str().trim_start_matches('%'));
        if let Err(paste_err) = self.mux.paste(pane, &buffer, text).await {
            tracing::debug!(pane = %pane, error = %paste_err, "paste failed, falling back to literal send");
            self.mux.send_literal(pane, text).await?;
        }

        tokio::time::sleep(self.options.echo_wait).await;

        if self.options.vim_mode {
            self.mux.send_key(pane, "Escape").await?;
        }

        let mut last_err = None;
        for attempt in 0..ENTER_ATTEMPTS {
            match self.mux.send_key(pane, "Enter").await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!(pane = %pane, attempt, error = %e, "enter retry");
                    last_err = Some(e);
                    tokio::time::sleep(self.options.enter_retry).await;
                }
            }
        }
        Err(last_err.unwrap_or_else(|| MuxError::CommandFailed("enter not delivered".into())))
    }
}

#[cfg(test)]
#[path = "send_tests.rs"]
mod tests;
