// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin / checkpoint coordinator
//!
//! Drives an at-most-one-in-flight "summarize yourself now" protocol per
//! role, degrades to an autogen summary when no response arrives, and
//! persists enough state to resume cleanly after a restart.

mod autogen;
mod log_watch;

pub use autogen::{heuristic_summary, parse_log_messages, render_transcript, LogMessage};
pub use log_watch::run_log_watchers;

use crate::injector::Injector;
use crate::lifecycle::Shutdown;
use relay_adapters::{BeadQuery, BeadSpec, BeadStore, BeadType, MuxAdapter, Summarizer};
use relay_core::{
    ChkId, Clock, Envelope, EventKind, EventRecord, Kind, MsgId, Role, Target, ContentPayload,
    RelayConfig, PRIORITY_URGENT,
};
use relay_storage::{AdminMetrics, AdminState, EventLog};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Reserved label values this writer stamps on agent checkpoints.
const WRITER_LABEL: &str = "relay";

/// One outstanding checkpoint request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub chk_id: ChkId,
    pub requested_at_ms: u64,
}

/// Mutable coordinator state, owned under the admin mutex.
#[derive(Default)]
struct AdminRuntime {
    last_relay_activity_ms: u64,
    last_log_growth_ms: HashMap<Role, u64>,
    last_checkpoint_time_ms: HashMap<Role, u64>,
    cooldown_until_ms: HashMap<Role, u64>,
    pending: HashMap<Role, PendingRequest>,
    session_logs: HashMap<Role, PathBuf>,
    metrics: AdminMetrics,
}

struct AdminInner<M: MuxAdapter, B: BeadStore, S: Summarizer, C: Clock> {
    state: Mutex<AdminRuntime>,
    injector: Injector<M, C>,
    beads: B,
    summarizer: Option<S>,
    events: EventLog<C>,
    clock: C,
    config: Arc<RelayConfig>,
    state_path: PathBuf,
    metrics_path: PathBuf,
}

/// The coordinator. Cheap to clone; all clones share state.
pub struct AdminCoordinator<M: MuxAdapter, B: BeadStore, S: Summarizer, C: Clock> {
    inner: Arc<AdminInner<M, B, S, C>>,
}

impl<M: MuxAdapter, B: BeadStore, S: Summarizer, C: Clock> Clone
    for AdminCoordinator<M, B, S, C>
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M, B, S, C> AdminCoordinator<M, B, S, C>
where
    M: MuxAdapter,
    B: BeadStore,
    S: Summarizer,
    C: Clock,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        injector: Injector<M, C>,
        beads: B,
        summarizer: Option<S>,
        events: EventLog<C>,
        clock: C,
        config: Arc<RelayConfig>,
        state_path: PathBuf,
        metrics_path: PathBuf,
    ) -> Self {
        Self {
            inner: Arc::new(AdminInner {
                state: Mutex::new(AdminRuntime::default()),
                injector,
                beads,
                summarizer,
                events,
                clock,
                config,
                state_path,
                metrics_path,
            }),
        }
    }

    /// The injector this coordinator enqueues requests through.
    pub fn injector(&self) -> &Injector<M, C> {
        &self.inner.injector
    }

    /// Roles the checkpoint protocol covers: every known role but admin.
    fn agent_roles(&self) -> Vec<Role> {
        self.inner
            .config
            .roles
            .iter()
            .filter(|r| !r.is_admin())
            .cloned()
            .collect()
    }

    /// Load persisted state; missing file is not an error.
    pub fn load_state(&self) {
        let persisted = AdminState::load(&self.inner.state_path);
        let metrics = AdminMetrics::load(&self.inner.metrics_path);
        let mut state = self.inner.state.lock();
        state.last_relay_activity_ms = persisted.last_relay_activity_ms;
        state.last_log_growth_ms = from_role_keys(persisted.last_log_growth_ms);
        state.last_checkpoint_time_ms = from_role_keys(persisted.last_checkpoint_time_ms);
        state.cooldown_until_ms = from_role_keys(persisted.cooldown_until_ms);
        state.metrics = metrics;
    }

    /// Seed unknown last-checkpoint times from the most recent recovery
    /// bead per role. Best-effort; query failures are logged.
    pub async fn seed_from_beads(&self) {
        for role in self.agent_roles() {
            let already_known = {
                let state = self.inner.state.lock();
                state
                    .last_checkpoint_time_ms
                    .get(&role)
                    .copied()
                    .unwrap_or(0)
                    > 0
            };
            if already_known {
                continue;
            }
            let query = BeadQuery {
                labels: vec![("role".into(), role.as_str().into())],
                limit: 1,
                ..Default::default()
            };
            match self.inner.beads.find_latest(BeadType::Recovery, &query).await {
                Ok(Some(item)) => {
                    if let Some(ms) = item
                        .created_at
                        .as_deref()
                        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                        .map(|t| t.timestamp_millis().max(0) as u64)
                    {
                        tracing::info!(role = %role, bead = %item.id, "seeded last checkpoint time from bead store");
                        self.inner
                            .state
                            .lock()
                            .last_checkpoint_time_ms
                            .insert(role.clone(), ms);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(role = %role, error = %e, "bead seed query failed");
                }
            }
        }
    }

    /// Persist the durable slice of state atomically.
    pub fn persist(&self) {
        let (snapshot, metrics) = {
            let state = self.inner.state.lock();
            (
                AdminState {
                    last_relay_activity_ms: state.last_relay_activity_ms,
                    last_log_growth_ms: to_role_keys(&state.last_log_growth_ms),
                    last_checkpoint_time_ms: to_role_keys(&state.last_checkpoint_time_ms),
                    cooldown_until_ms: to_role_keys(&state.cooldown_until_ms),
                },
                state.metrics.clone(),
            )
        };
        if let Err(e) = snapshot.save(&self.inner.state_path) {
            tracing::warn!(error = %e, "failed to persist admin state");
        }
        if let Err(e) = metrics.save(&self.inner.metrics_path) {
            tracing::warn!(error = %e, "failed to persist admin metrics");
        }
    }

    /// Mark relay traffic now (resets the relay-idle trigger gate).
    pub fn note_relay_activity(&self) {
        let now = self.inner.clock.epoch_ms();
        self.inner.state.lock().last_relay_activity_ms = now;
    }

    /// Mark a role's session log as having just grown.
    pub fn note_log_growth(&self, role: &Role) {
        let now = self.inner.clock.epoch_ms();
        self.inner
            .state
            .lock()
            .last_log_growth_ms
            .insert(role.clone(), now);
    }

    /// Replace the discovered role→session-log map.
    pub fn set_session_logs(&self, logs: HashMap<Role, PathBuf>) {
        self.inner.state.lock().session_logs = logs;
    }

    /// Current role→session-log map.
    pub fn session_logs(&self) -> HashMap<Role, PathBuf> {
        self.inner.state.lock().session_logs.clone()
    }

    fn session_log(&self, role: &Role) -> Option<PathBuf> {
        self.inner.state.lock().session_logs.get(role).cloned()
    }

    /// Count a health-check injection in the metrics mirror.
    pub fn note_health_check(&self) {
        self.inner.state.lock().metrics.health_checks += 1;
    }

    /// Count a completed recycle in the metrics mirror.
    pub fn note_recycle(&self) {
        self.inner.state.lock().metrics.recycles += 1;
    }

    /// Outstanding request id for a role, if any.
    pub fn pending_chk_id(&self, role: &Role) -> Option<ChkId> {
        self.inner
            .state
            .lock()
            .pending
            .get(role)
            .map(|p| p.chk_id.clone())
    }

    /// One coordinator tick: triggers strictly before timeouts.
    pub async fn tick(&self) {
        self.check_triggers();
        self.check_timeouts();
    }

    /// Tick and persist on their intervals until shutdown.
    pub async fn run(self, mut shutdown: Shutdown) {
        let mut tick = tokio::time::interval(crate::env::admin_tick_ms());
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut persist = tokio::time::interval(crate::env::admin_persist_ms());
        persist.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => self.tick().await,
                _ = persist.tick() => self.persist(),
                _ = shutdown.cancelled() => {
                    self.persist();
                    return;
                }
            }
        }
    }

    fn check_triggers(&self) {
        let now = self.inner.clock.epoch_ms();
        let config = &self.inner.config;
        let mut requests = Vec::new();

        {
            let mut state = self.inner.state.lock();
            let relay_idle = state.last_relay_activity_ms == 0
                || now.saturating_sub(state.last_relay_activity_ms)
                    >= config.relay_idle_threshold.as_millis() as u64;

            for role in self.agent_roles() {
                if state.pending.contains_key(&role) {
                    continue;
                }
                if now < state.cooldown_until_ms.get(&role).copied().unwrap_or(0) {
                    continue;
                }
                let last_checkpoint = state
                    .last_checkpoint_time_ms
                    .get(&role)
                    .copied()
                    .unwrap_or(0);
                if last_checkpoint != 0
                    && now.saturating_sub(last_checkpoint)
                        < config.min_checkpoint_interval.as_millis() as u64
                {
                    continue;
                }
                if !relay_idle {
                    continue;
                }
                let last_growth = state.last_log_growth_ms.get(&role).copied().unwrap_or(0);
                let log_stable = last_growth == 0
                    || now.saturating_sub(last_growth)
                        >= config.session_log_stable_threshold.as_millis() as u64;
                if !log_stable {
                    continue;
                }

                let chk_id = ChkId::generate();
                state.pending.insert(
                    role.clone(),
                    PendingRequest {
                        chk_id: chk_id.clone(),
                        requested_at_ms: now,
                    },
                );
                state.metrics.checkpoint_requests += 1;
                requests.push((role, chk_id));
            }
        }

        for (role, chk_id) in requests {
            let envelope = Envelope {
                msg_id: MsgId::generate(),
                ts: self.inner.clock.rfc3339(),
                project_id: None,
                from: Role::new(relay_core::ADMIN),
                to: Target::Role(role.clone()),
                kind: Kind::CheckpointRequest,
                priority: PRIORITY_URGENT,
                thread_id: Some(chk_id.as_str().to_string()),
                payload: format!("[CHECKPOINT_REQUEST] chk_id={chk_id}"),
                ephemeral: true,
            };
            if let Err(e) = self.inner.injector.inject(envelope) {
                tracing::warn!(role = %role, error = %e, "checkpoint request enqueue failed");
                self.inner.state.lock().pending.remove(&role);
                continue;
            }
            self.inner.events.log_best_effort(
                EventRecord::new(EventKind::CheckpointRequest)
                    .to_role(role)
                    .chk(chk_id),
            );
        }
    }

    fn check_timeouts(&self) {
        let now = self.inner.clock.epoch_ms();
        let timeout_ms = self.inner.config.ack_timeout.as_millis() as u64;
        let expired: Vec<(Role, PendingRequest)> = {
            let mut state = self.inner.state.lock();
            let expired_roles: Vec<Role> = state
                .pending
                .iter()
                .filter(|(_, p)| now.saturating_sub(p.requested_at_ms) >= timeout_ms)
                .map(|(r, _)| r.clone())
                .collect();
            expired_roles
                .into_iter()
                .filter_map(|r| {
                    state.metrics.checkpoint_timeouts += 1;
                    state.pending.remove(&r).map(|p| (r, p))
                })
                .collect()
        };

        for (role, pending) in expired {
            tracing::warn!(role = %role, chk_id = %pending.chk_id, "checkpoint ack timeout, falling back to autogen");
            self.inner.events.log_best_effort(
                EventRecord::new(EventKind::Timeout)
                    .to_role(role.clone())
                    .chk(pending.chk_id.clone()),
            );
            // Autogen runs in its own task so the tick never blocks on
            // file reads or the summarizer.
            let coordinator = self.clone();
            tokio::spawn(async move {
                coordinator.run_autogen(role, pending.chk_id).await;
            });
        }
    }

    /// ACK path: only the single legal reply clears a pending request.
    pub fn handle_ack(&self, envelope: &Envelope) {
        let now = self.inner.clock.epoch_ms();
        let role = envelope.from.clone();
        let chk_id = extract_chk_id(envelope);

        let matched = {
            let mut state = self.inner.state.lock();
            let is_match = matches!(
                (state.pending.get(&role), &chk_id),
                (Some(pending), Some(chk)) if pending.chk_id == *chk
            );
            if is_match {
                let pending = state.pending.remove(&role);
                state.last_checkpoint_time_ms.insert(role.clone(), now);
                state.cooldown_until_ms.insert(
                    role.clone(),
                    now + self.inner.config.cooldown_after_checkpoint.as_millis() as u64,
                );
                state.metrics.checkpoint_acks += 1;
                pending.map(|p| now.saturating_sub(p.requested_at_ms))
            } else {
                None
            }
        };

        match matched {
            Some(latency_ms) => {
                self.inner.events.log_best_effort(
                    EventRecord::new(EventKind::CheckpointAck)
                        .from_role(role)
                        .chk(chk_id.unwrap_or_else(|| ChkId::new("")))
                        .latency_ms(latency_ms),
                );
            }
            None => {
                let mut record =
                    EventRecord::new(EventKind::CheckpointAckIgnored).from_role(role);
                if let Some(chk) = chk_id {
                    record = record.chk(chk);
                }
                self.inner.events.log_best_effort(record);
            }
        }
    }

    /// Content path: three gates, then the single-writer bead write.
    pub async fn handle_content(&self, envelope: &Envelope) {
        let content = match ContentPayload::parse(&envelope.payload) {
            Ok(content) => content,
            Err(e) => {
                self.inner.events.log_best_effort(
                    EventRecord::new(EventKind::ParseError)
                        .from_role(envelope.from.clone())
                        .error(format!("checkpoint content: {e}")),
                );
                return;
            }
        };

        // Gates run in order; each rejection has its own event kind.
        // Evaluated under the lock, reported after it drops.
        let gate = {
            let state = self.inner.state.lock();
            match state.pending.get(&content.role) {
                None => Err(EventRecord::new(EventKind::CheckpointContentNoPending)),
                Some(pending) if pending.chk_id != content.chk_id => Err(
                    EventRecord::new(EventKind::CheckpointContentStale)
                        .error(format!("expected {}", pending.chk_id)),
                ),
                Some(_) if envelope.from != content.role => {
                    Err(EventRecord::new(EventKind::CheckpointContentWrongSender))
                }
                Some(pending) => Ok(pending.requested_at_ms),
            }
        };
        let requested_at_ms = match gate {
            Ok(requested_at_ms) => requested_at_ms,
            Err(record) => {
                self.inner.events.log_best_effort(
                    record
                        .from_role(envelope.from.clone())
                        .to_role(content.role.clone())
                        .chk(content.chk_id.clone()),
                );
                return;
            }
        };

        let mut labels: Vec<(String, String)> = vec![
            ("role".into(), content.role.as_str().into()),
            ("chk_id".into(), content.chk_id.as_str().into()),
            ("source".into(), "agent".into()),
            ("confidence".into(), "high".into()),
            ("writer".into(), WRITER_LABEL.into()),
        ];
        labels.extend(content.labels.iter().map(|(k, v)| (k.clone(), v.clone())));

        let spec = BeadSpec {
            bead_type: BeadType::Recovery,
            title: content
                .title
                .clone()
                .unwrap_or_else(|| format!("{} checkpoint {}", content.role, content.chk_id)),
            labels,
            body: content.content.clone(),
        };

        match self.inner.beads.create(&spec).await {
            Ok(bead_id) => {
                let now = self.inner.clock.epoch_ms();
                {
                    let mut state = self.inner.state.lock();
                    // A timeout may have raced us; clearing is idempotent.
                    if state
                        .pending
                        .get(&content.role)
                        .is_some_and(|p| p.chk_id == content.chk_id)
                    {
                        state.pending.remove(&content.role);
                    }
                    state
                        .last_checkpoint_time_ms
                        .insert(content.role.clone(), now);
                    state.cooldown_until_ms.insert(
                        content.role.clone(),
                        now + self.inner.config.cooldown_after_checkpoint.as_millis() as u64,
                    );
                    state.metrics.checkpoint_acks += 1;
                    state.metrics.beads_written += 1;
                }
                self.inner.events.log_best_effort(
                    EventRecord::new(EventKind::CheckpointAck)
                        .from_role(content.role.clone())
                        .chk(content.chk_id.clone())
                        .status(format!("written:{bead_id}"))
                        .latency_ms(now.saturating_sub(requested_at_ms)),
                );
            }
            Err(e) => {
                // Pending stays: the next tick can retry or time out.
                self.inner.state.lock().metrics.bead_failures += 1;
                self.inner.events.log_best_effort(
                    EventRecord::new(EventKind::BeadWriteFailed)
                        .from_role(content.role.clone())
                        .chk(content.chk_id.clone())
                        .error(e.to_string()),
                );
            }
        }
    }
}

/// Find the `chk-XXXXXXXX` correlation id in an envelope: `thread_id`
/// first, then a scan of the payload.
pub fn extract_chk_id(envelope: &Envelope) -> Option<ChkId> {
    if let Some(thread) = envelope.thread_id.as_deref() {
        if let Some(chk) = scan_chk_id(thread) {
            return Some(chk);
        }
    }
    scan_chk_id(&envelope.payload)
}

fn scan_chk_id(text: &str) -> Option<ChkId> {
    let mut rest = text;
    while let Some(idx) = rest.find("chk-") {
        let candidate = &rest[idx + 4..];
        let hex: String = candidate
            .chars()
            .take(8)
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        if hex.len() == 8 {
            return Some(ChkId::new(format!("chk-{hex}")));
        }
        rest = &rest[idx + 4..];
    }
    None
}

fn from_role_keys(map: HashMap<String, u64>) -> HashMap<Role, u64> {
    map.into_iter().map(|(k, v)| (Role::new(k), v)).collect()
}

fn to_role_keys(map: &HashMap<Role, u64>) -> HashMap<String, u64> {
    map.iter()
        .map(|(k, v)| (k.as_str().to_string(), *v))
        .collect()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
