// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin timer and pane recycler
//!
//! Two tickers in one task: a health-check ticker injecting allow-listed
//! slash commands into the admin pane, and a checkpoint-cycle ticker
//! that counts cycles and, at the recycle threshold, runs the
//! capture / exit / wait-for-prompt / relaunch sequence.

use crate::admin::AdminCoordinator;
use crate::idle::{IdleDetector, IdleStatus};
use crate::injector::{prompt_line_ready, Injector};
use crate::lifecycle::Shutdown;
use crate::session_map::SessionMapService;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use relay_adapters::subprocess::{run_with_timeout, ALERT_HOOK_TIMEOUT};
use relay_adapters::{BeadStore, MuxAdapter, PaneSender, Summarizer};
use relay_core::{
    Clock, Envelope, EventKind, EventRecord, Kind, MsgId, PaneMap, RelayConfig, Role, Target,
    ADMIN, PRIORITY_URGENT,
};
use relay_storage::{load_pane_map, EventLog};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;

/// The only commands ever injected into the admin pane.
pub const ADMIN_COMMAND_ALLOWLIST: [&str; 4] = ["/health-check", "/register-panes", "/ack", "/exit"];

/// Lines captured into `last-life.txt` before a recycle.
const LAST_LIFE_LINES: u32 = 200;

struct TimerState {
    checkpoint_cycles: u32,
    start_time_ms: u64,
    last_inject_ms: u64,
    last_recycle_ms: u64,
    pane_map_refreshed: bool,
}

/// Dependencies for the admin timer, gathered at startup.
pub struct AdminTimerDeps<M: MuxAdapter, B: BeadStore, S: Summarizer, C: Clock> {
    pub injector: Injector<M, C>,
    pub sender: PaneSender<M>,
    pub admin: AdminCoordinator<M, B, S, C>,
    pub session_map: SessionMapService<M, B, S, C>,
    pub events: EventLog<C>,
    pub clock: C,
    pub config: Arc<RelayConfig>,
    pub pane_map: Arc<RwLock<PaneMap>>,
    pub pane_map_path: PathBuf,
    pub last_life_path: PathBuf,
    pub idle: IdleDetector<C>,
}

/// Health-check and checkpoint-cycle tickers plus the recycler.
pub struct AdminTimer<M: MuxAdapter, B: BeadStore, S: Summarizer, C: Clock> {
    deps: AdminTimerDeps<M, B, S, C>,
    state: Mutex<TimerState>,
}

impl<M, B, S, C> AdminTimer<M, B, S, C>
where
    M: MuxAdapter,
    B: BeadStore,
    S: Summarizer,
    C: Clock,
{
    pub fn new(deps: AdminTimerDeps<M, B, S, C>) -> Self {
        let now = deps.clock.epoch_ms();
        Self {
            deps,
            state: Mutex::new(TimerState {
                checkpoint_cycles: 0,
                start_time_ms: now,
                last_inject_ms: 0,
                last_recycle_ms: 0,
                pane_map_refreshed: false,
            }),
        }
    }

    /// Run both tickers until shutdown.
    pub async fn run(self, mut shutdown: Shutdown) {
        let mut health = tokio::time::interval(self.deps.config.health_check_interval);
        health.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut cycle = tokio::time::interval(self.deps.config.checkpoint_interval);
        cycle.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // Both intervals fire immediately; consume the initial ticks.
        health.tick().await;
        cycle.tick().await;

        loop {
            tokio::select! {
                _ = health.tick() => self.health_tick().await,
                _ = cycle.tick() => self.cycle_tick().await,
                _ = shutdown.cancelled() => return,
            }
        }
    }

    /// Inject the periodic health check and evaluate the deadman switch.
    pub async fn health_tick(&self) {
        if self.inject_admin_command("/health-check") {
            self.deps.admin.note_health_check();
        }
        self.check_deadman().await;
    }

    /// One checkpoint cycle: idle gate, cycle injection, pane-map
    /// staleness repair, recycle threshold.
    pub async fn cycle_tick(&self) {
        match self.deps.idle.status() {
            IdleStatus::AllIdle => {
                self.deps
                    .events
                    .log_best_effort(EventRecord::new(EventKind::CheckpointSkippedIdle));
            }
            IdleStatus::Active | IdleStatus::Backstop => {
                let cmd = self.deps.config.checkpoint_cycle_cmd.clone();
                if self.inject_admin_command(&cmd) {
                    self.deps.idle.note_injection();
                    self.state.lock().checkpoint_cycles += 1;
                }
            }
        }

        self.refresh_pane_map_if_stale().await;

        let now = self.deps.clock.epoch_ms();
        let (cycles, uptime_ms) = {
            let state = self.state.lock();
            (
                state.checkpoint_cycles,
                now.saturating_sub(state.start_time_ms),
            )
        };
        let config = &self.deps.config;
        if cycles >= config.admin_recycle_cycles
            || uptime_ms >= config.admin_max_uptime.as_millis() as u64
        {
            self.recycle().await;
        }
    }

    /// Enqueue one allow-listed slash command for the admin pane.
    ///
    /// Returns whether the command was accepted.
    pub fn inject_admin_command(&self, cmd: &str) -> bool {
        if !ADMIN_COMMAND_ALLOWLIST.contains(&cmd) {
            tracing::warn!(cmd, "rejected non-allow-listed admin command");
            self.deps.events.log_best_effort(
                EventRecord::new(EventKind::AdminCommandRejected).status(cmd.to_string()),
            );
            return false;
        }

        let envelope = Envelope {
            msg_id: MsgId::generate(),
            ts: self.deps.clock.rfc3339(),
            project_id: None,
            from: Role::new(ADMIN),
            to: Target::Role(Role::new(ADMIN)),
            kind: Kind::Command,
            priority: PRIORITY_URGENT,
            thread_id: None,
            payload: cmd.to_string(),
            ephemeral: true,
        };
        match self.deps.injector.inject(envelope) {
            Ok(()) => {
                self.state.lock().last_inject_ms = self.deps.clock.epoch_ms();
                true
            }
            Err(e) => {
                tracing::warn!(cmd, error = %e, "admin command enqueue failed");
                false
            }
        }
    }

    async fn check_deadman(&self) {
        let Some(threshold) = self.deps.config.deadman_threshold else {
            return;
        };
        let now = self.deps.clock.epoch_ms();
        let reference = {
            let state = self.state.lock();
            if state.last_inject_ms != 0 {
                state.last_inject_ms
            } else {
                state.start_time_ms
            }
        };
        let silent_ms = now.saturating_sub(reference);
        if silent_ms <= threshold.as_millis() as u64 {
            return;
        }

        let message = format!(
            "relay admin pane silent for {} (threshold {})",
            silence_label(silent_ms),
            silence_label(threshold.as_millis() as u64),
        );
        tracing::error!(silent_ms, "admin deadman triggered");
        self.deps.events.log_best_effort(
            EventRecord::new(EventKind::AdminDeadman)
                .error(message.clone())
                .latency_ms(silent_ms),
        );

        if let Some(hook) = &self.deps.config.admin_alert_hook {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", hook]);
            cmd.env("RELAY_ALERT_MESSAGE", &message);
            if let Err(e) = run_with_timeout(cmd, ALERT_HOOK_TIMEOUT, "alert hook").await {
                tracing::warn!(error = %e, "alert hook failed");
            }
        }
    }

    /// The recycle sequence: capture, exit, wait for a shell prompt,
    /// relaunch, reset counters.
    pub async fn recycle(&self) {
        let admin = Role::new(ADMIN);
        let Some(pane) = self.deps.injector.resolve(&admin) else {
            tracing::warn!("recycle skipped: no admin pane mapped");
            return;
        };

        // 1. Preserve the pane's last life for post-mortems. Best-effort.
        match self.deps.sender.mux().capture_tail(&pane, LAST_LIFE_LINES).await {
            Ok(tail) => {
                if let Err(e) = relay_storage::write_atomic(&self.deps.last_life_path, tail.as_bytes())
                {
                    tracing::warn!(error = %e, "failed to write last-life capture");
                }
            }
            Err(e) => tracing::warn!(error = %e, "last-life capture failed"),
        }

        // 2. Ask the agent to exit, through the same send path messages use.
        if let Err(e) = self.deps.sender.send_message(&pane, "/exit").await {
            tracing::warn!(error = %e, "exit injection failed, continuing recycle");
        }

        // 3. Wait for the shell prompt to come back.
        let attempts = crate::env::recycle_poll_attempts();
        let mut prompt_seen = false;
        for _ in 0..attempts {
            tokio::time::sleep(crate::env::recycle_poll_ms()).await;
            if let Ok(tail) = self.deps.sender.mux().capture_tail(&pane, 5).await {
                if prompt_line_ready(&tail) {
                    prompt_seen = true;
                    break;
                }
            }
        }
        if !prompt_seen {
            tracing::warn!(attempts, "shell prompt never appeared, relaunching anyway");
        }

        // 4. Relaunch the agent.
        match &self.deps.config.admin_relaunch_cmd {
            Some(cmd) => {
                if let Err(e) = self.deps.sender.send_message(&pane, cmd).await {
                    tracing::error!(error = %e, "relaunch injection failed");
                }
            }
            None => tracing::warn!("no relaunch command configured"),
        }

        // 5–6. Record completion and reset the counters.
        let now = self.deps.clock.epoch_ms();
        self.deps
            .events
            .log_best_effort(EventRecord::new(EventKind::AdminRecycleComplete).to_role(admin));
        self.deps.admin.note_recycle();
        {
            let mut state = self.state.lock();
            state.checkpoint_cycles = 0;
            state.start_time_ms = now;
            state.last_recycle_ms = now;
            state.pane_map_refreshed = false;
        }

        // The relaunched agent gets a fresh session log.
        self.deps.session_map.refresh().await;
    }

    /// When the pane map predates the last recycle, ask the admin agent
    /// to re-register panes and reload. Runs at most once per staleness
    /// detection.
    pub async fn refresh_pane_map_if_stale(&self) {
        let (last_recycle_ms, already_refreshed) = {
            let state = self.state.lock();
            (state.last_recycle_ms, state.pane_map_refreshed)
        };
        if already_refreshed {
            return;
        }
        let last_recycle = (last_recycle_ms > 0)
            .then(|| DateTime::<Utc>::from_timestamp_millis(last_recycle_ms as i64))
            .flatten();
        let stale = self.deps.pane_map.read().is_stale(last_recycle);
        if !stale {
            return;
        }

        tracing::info!("pane map stale, requesting re-registration");
        if !self.inject_admin_command("/register-panes") {
            return;
        }
        tokio::time::sleep(crate::env::register_panes_wait_ms()).await;

        match load_pane_map(&self.deps.pane_map_path) {
            Ok(map) => {
                self.deps.injector.update_targets(map.panes.clone());
                let version = map.version;
                *self.deps.pane_map.write() = map;
                self.state.lock().pane_map_refreshed = true;
                self.deps.events.log_best_effort(
                    EventRecord::new(EventKind::PaneMapReloaded).count(version),
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "pane map reload failed after re-registration");
            }
        }
    }
}

/// Render a silence interval for the deadman message and alert hook.
///
/// Pane silence is minutes-to-hours scale, so anything past the hour
/// mark keeps zero-padded minutes (`"1h05m"`) for log greppability.
fn silence_label(ms: u64) -> String {
    let secs = ms / 1000;
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s => {
            let minutes = (s % 3600) / 60;
            if minutes == 0 {
                format!("{}h", s / 3600)
            } else {
                format!("{}h{minutes:02}m", s / 3600)
            }
        }
    }
}

#[cfg(test)]
#[path = "recycler_tests.rs"]
mod tests;
