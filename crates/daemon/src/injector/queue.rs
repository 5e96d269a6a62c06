// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-pane FIFO queue
//!
//! Head is always the oldest message; requeue on transient failure
//! restores the head. Priority is accepted and logged but never reorders.

use parking_lot::Mutex;
use relay_core::Envelope;
use std::collections::VecDeque;
use tokio::sync::Notify;

/// One queued message.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub envelope: Envelope,
    pub enqueued_at_ms: u64,
}

/// FIFO queue for one role's pane, owned by that role's worker.
#[derive(Default)]
pub struct PaneQueue {
    items: Mutex<VecDeque<QueuedMessage>>,
    notify: Notify,
}

impl PaneQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail and wake the worker.
    pub fn push_back(&self, message: QueuedMessage) {
        self.items.lock().push_back(message);
        self.notify.notify_one();
    }

    /// Restore a message at the head after a transient failure.
    pub fn push_front(&self, message: QueuedMessage) {
        self.items.lock().push_front(message);
        self.notify.notify_one();
    }

    pub fn pop_front(&self) -> Option<QueuedMessage> {
        self.items.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Wait until something is (probably) queued.
    pub async fn wait_nonempty(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
