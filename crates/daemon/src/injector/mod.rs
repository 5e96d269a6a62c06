// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-pane injector
//!
//! Owns one FIFO queue per role, delivers queued payloads to the mapped
//! pane as keystrokes behind a readiness gate, retries transient
//! failures with bounded backoff, and drops messages past their age
//! limit. Target resolution goes through the injector's own snapshot,
//! replaced only via [`Injector::update_targets`].

mod gate;
mod queue;

pub use gate::{pane_ready, prompt_line_ready, GateDecision, PROMPT_GLYPHS};
pub use queue::{PaneQueue, QueuedMessage};

use crate::lifecycle::{spawn_guarded, Fatal, Shutdown};
use indexmap::IndexMap;
use parking_lot::RwLock;
use relay_adapters::{MuxAdapter, PaneSender};
use relay_core::{
    wrap_relay_message, Clock, Envelope, EnvelopeError, EventKind, EventRecord, PaneId,
    PromptGating, Role, Target,
};
use relay_storage::EventLog;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Backoff schedule for a blocked head, capped at the last entry.
const BACKOFF_MS: [u64; 5] = [250, 500, 1000, 2000, 5000];

/// Characters kept of a pane tail in `blocked` events.
const TAIL_SNIPPET_CHARS: usize = 120;

/// Errors returned by [`Injector::inject`].
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("unknown-target: {0}")]
    UnknownTarget(Role),
    #[error("broadcast must be expanded before the injector")]
    BroadcastNotExpanded,
    #[error(transparent)]
    Invalid(#[from] EnvelopeError),
}

struct InjectorInner<M: MuxAdapter, C: Clock> {
    queues: HashMap<Role, PaneQueue>,
    targets: RwLock<IndexMap<Role, PaneId>>,
    sender: PaneSender<M>,
    events: EventLog<C>,
    clock: C,
    gating: PromptGating,
    queue_max_age: Duration,
}

/// The injector. Cheap to clone; all clones share queues and targets.
pub struct Injector<M: MuxAdapter, C: Clock> {
    inner: Arc<InjectorInner<M, C>>,
}

impl<M: MuxAdapter, C: Clock> Clone for Injector<M, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: MuxAdapter, C: Clock> Injector<M, C> {
    pub fn new(
        roles: &[Role],
        targets: IndexMap<Role, PaneId>,
        sender: PaneSender<M>,
        events: EventLog<C>,
        clock: C,
        gating: PromptGating,
        queue_max_age: Duration,
    ) -> Self {
        let queues = roles
            .iter()
            .map(|r| (r.clone(), PaneQueue::new()))
            .collect();
        Self {
            inner: Arc::new(InjectorInner {
                queues,
                targets: RwLock::new(targets),
                sender,
                events,
                clock,
                gating,
                queue_max_age,
            }),
        }
    }

    /// Replace the role→pane snapshot (pane-map reload, recycle).
    pub fn update_targets(&self, targets: IndexMap<Role, PaneId>) {
        *self.inner.targets.write() = targets;
    }

    /// Current pane for a role, if mapped.
    pub fn resolve(&self, role: &Role) -> Option<PaneId> {
        self.inner.targets.read().get(role).cloned()
    }

    /// Queue depth for a role (0 for unknown roles).
    pub fn queue_len(&self, role: &Role) -> usize {
        self.inner.queues.get(role).map(PaneQueue::len).unwrap_or(0)
    }

    /// Validate and enqueue one envelope. Never blocks.
    pub fn inject(&self, envelope: Envelope) -> Result<(), InjectError> {
        envelope.validate()?;
        let Target::Role(role) = envelope.to.clone() else {
            return Err(InjectError::BroadcastNotExpanded);
        };

        let mapped = self.inner.targets.read().contains_key(&role);
        let queue = self.inner.queues.get(&role);
        let (true, Some(queue)) = (mapped, queue) else {
            self.inner.events.log_best_effort(
                EventRecord::new(EventKind::UnknownTarget)
                    .from_role(envelope.from.clone())
                    .to_role(role.clone())
                    .msg(envelope.msg_id.clone()),
            );
            return Err(InjectError::UnknownTarget(role));
        };

        self.inner.events.log_best_effort(
            EventRecord::new(EventKind::Enqueue)
                .from_role(envelope.from.clone())
                .to_role(role)
                .msg(envelope.msg_id.clone()),
        );
        queue.push_back(QueuedMessage {
            enqueued_at_ms: self.inner.clock.epoch_ms(),
            envelope,
        });
        Ok(())
    }

    /// Spawn one worker per role under panic guards.
    pub fn start(&self, shutdown: &Shutdown, fatal_tx: mpsc::Sender<Fatal>) {
        for role in self.inner.queues.keys() {
            let injector = self.clone();
            let role = role.clone();
            let shutdown = shutdown.clone();
            spawn_guarded("injector-worker", fatal_tx.clone(), async move {
                injector.worker_loop(role, shutdown).await;
            });
        }
    }

    async fn worker_loop(self, role: Role, mut shutdown: Shutdown) {
        let Some(queue) = self.inner.queues.get(&role) else {
            return;
        };
        let mut backoff_step: usize = 0;
        let mut current_head = None;

        loop {
            if shutdown.is_cancelled() {
                return;
            }
            let Some(queued) = queue.pop_front() else {
                tokio::select! {
                    _ = queue.wait_nonempty() => continue,
                    _ = shutdown.cancelled() => return,
                }
            };

            // Backoff belongs to one head; a new head starts fresh.
            if current_head.as_ref() != Some(&queued.envelope.msg_id) {
                current_head = Some(queued.envelope.msg_id.clone());
                backoff_step = 0;
            }

            let age_ms = self
                .inner
                .clock
                .epoch_ms()
                .saturating_sub(queued.enqueued_at_ms);
            if age_ms > self.inner.queue_max_age.as_millis() as u64 {
                tracing::warn!(role = %role, msg_id = %queued.envelope.msg_id, age_ms, "dropping over-age message");
                self.inner.events.log_best_effort(
                    EventRecord::new(EventKind::Drop)
                        .from_role(queued.envelope.from.clone())
                        .to_role(role.clone())
                        .msg(queued.envelope.msg_id.clone())
                        .latency_ms(age_ms),
                );
                continue;
            }

            let Some(pane) = self.resolve(&role) else {
                self.block(queue, &role, queued, "no pane mapped".to_string(), &mut backoff_step, &mut shutdown)
                    .await;
                continue;
            };

            let envelope = &queued.envelope;
            let outcome = if envelope.is_slash_command() {
                // Slash commands bypass the gate and the wrapper.
                let bare = envelope.payload.trim().to_string();
                self.inner.sender.send_message(&pane, &bare).await
            } else {
                match pane_ready(self.inner.sender.mux(), &pane, &role, self.inner.gating).await {
                    GateDecision::Ready => {
                        let wrapped = wrap_relay_message(
                            &envelope.from,
                            &role,
                            envelope.kind,
                            &envelope.payload,
                        );
                        self.inner.sender.send_message(&pane, &wrapped).await
                    }
                    GateDecision::NotReady { tail } => {
                        self.block(queue, &role, queued, tail, &mut backoff_step, &mut shutdown)
                            .await;
                        continue;
                    }
                }
            };

            match outcome {
                Ok(()) => {
                    self.inner.events.log_best_effort(
                        EventRecord::new(EventKind::Inject)
                            .from_role(envelope.from.clone())
                            .to_role(role.clone())
                            .msg(envelope.msg_id.clone()),
                    );
                }
                Err(e) => {
                    self.block(queue, &role, queued, e.to_string(), &mut backoff_step, &mut shutdown)
                        .await;
                }
            }
        }
    }

    /// Record a blocked head, requeue it, and sleep the backoff.
    async fn block(
        &self,
        queue: &PaneQueue,
        role: &Role,
        queued: QueuedMessage,
        tail: String,
        backoff_step: &mut usize,
        shutdown: &mut Shutdown,
    ) {
        self.inner.events.log_best_effort(
            EventRecord::new(EventKind::Blocked)
                .from_role(queued.envelope.from.clone())
                .to_role(role.clone())
                .msg(queued.envelope.msg_id.clone())
                .status(snippet(&tail)),
        );
        queue.push_front(queued);

        let delay = BACKOFF_MS[(*backoff_step).min(BACKOFF_MS.len() - 1)];
        *backoff_step += 1;
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
            _ = shutdown.cancelled() => {}
        }
    }
}

/// Char-safe truncation of a pane tail for event payloads.
fn snippet(tail: &str) -> String {
    let flat = tail.replace('\n', " ⏎ ");
    let trimmed = flat.trim();
    if trimmed.chars().count() <= TAIL_SNIPPET_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().take(TAIL_SNIPPET_CHARS).collect::<String>() + "…"
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
