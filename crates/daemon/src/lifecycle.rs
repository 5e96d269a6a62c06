// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: lockfile, cancellation, panic guards, tombstone.

use fs2::FileExt;
use relay_core::{Clock, RelayConfig};
use relay_storage::{ExitReason, Tombstone};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("configuration error: {0}")]
    Config(#[from] relay_core::ConfigError),

    #[error("another relay daemon holds the lock at {path}")]
    LockContended { path: PathBuf },

    #[error("storage error: {0}")]
    Storage(#[from] relay_storage::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolved state-file locations for one daemon instance.
#[derive(Debug, Clone)]
pub struct Paths {
    pub lock: PathBuf,
    pub pid: PathBuf,
    pub tombstone: PathBuf,
    pub pane_map: PathBuf,
    pub offsets: PathBuf,
    pub admin_state: PathBuf,
    pub admin_metrics: PathBuf,
    pub events: PathBuf,
    pub last_life: PathBuf,
    pub daemon_log: PathBuf,
}

impl Paths {
    pub fn new(config: &RelayConfig) -> Self {
        let state = &config.state_dir;
        Self {
            lock: state.join("relay-daemon.lock"),
            pid: state.join("relay-daemon.pid"),
            tombstone: state.join("last-exit.json"),
            pane_map: config.pane_map_path.clone(),
            offsets: state.join("offsets.json"),
            admin_state: state.join("admin-state.json"),
            admin_metrics: state.join("admin-metrics.json"),
            events: config.log_dir.join("events.jsonl"),
            last_life: state.join("last-life.txt"),
            daemon_log: config.log_dir.join("relay-daemon.log"),
        }
    }
}

/// A fatal condition that must take the whole daemon down.
#[derive(Debug, Clone)]
pub struct Fatal {
    pub reason: ExitReason,
    pub detail: String,
}

impl Fatal {
    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            reason: ExitReason::Error,
            detail: detail.into(),
        }
    }

    pub fn panic(detail: impl Into<String>) -> Self {
        Self {
            reason: ExitReason::Panic,
            detail: detail.into(),
        }
    }
}

/// Cancellation signal handed to every long-lived activity.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> (ShutdownHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (ShutdownHandle { tx }, Self { rx })
    }

    /// Resolves when shutdown has been requested.
    pub async fn cancelled(&mut self) {
        // Already cancelled, or sender dropped (treat as cancelled).
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// The cancelling side of [`Shutdown`].
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Spawn a long-lived task; a panic inside becomes a [`Fatal`] on the
/// shared error channel instead of a silent task death.
pub fn spawn_guarded<F>(name: &'static str, fatal_tx: mpsc::Sender<Fatal>, future: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let handle = tokio::spawn(future);
    tokio::spawn(async move {
        if let Err(join_err) = handle.await {
            if join_err.is_panic() {
                let payload = join_err.into_panic();
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(task = name, detail, "task panicked");
                let _ = fatal_tx.send(Fatal::panic(format!("{name}: {detail}"))).await;
            }
        }
    });
}

/// Acquire the exclusive advisory lock, failing fast when contended.
///
/// The returned file must be held for the life of the daemon; the lock
/// releases on drop.
pub fn acquire_lock(path: &std::path::Path) -> Result<File, LifecycleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Avoid truncating before we hold the lock, which would wipe the
    // running daemon's pid.
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    file.try_lock_exclusive().map_err(|_| LifecycleError::LockContended {
        path: path.to_path_buf(),
    })?;

    let mut file = file;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

/// Write the pid file (plain decimal, newline-terminated).
pub fn write_pid(path: &std::path::Path) -> Result<(), LifecycleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, format!("{}\n", std::process::id()))?;
    Ok(())
}

/// Write the last-exit tombstone. Best-effort: failure is logged, never
/// propagated, because this runs on every exit path including panic.
pub fn write_tombstone<C: Clock>(
    paths: &Paths,
    clock: &C,
    start_time: Instant,
    reason: ExitReason,
    detail: &str,
) {
    let tombstone = Tombstone {
        timestamp: clock.rfc3339(),
        reason,
        detail: detail.to_string(),
        pid: std::process::id(),
        uptime_seconds: start_time.elapsed().as_secs(),
    };
    if let Err(e) = tombstone.save(&paths.tombstone) {
        tracing::error!(error = %e, "failed to write tombstone");
    }
}

/// Re-read the pane-map file when its mtime changes and push the new
/// targets into the injector (property: a strictly newer mtime is
/// visible within one reload interval).
pub async fn pane_map_reloader<M: relay_adapters::MuxAdapter, C: Clock>(
    path: PathBuf,
    shared_map: std::sync::Arc<parking_lot::RwLock<relay_core::PaneMap>>,
    injector: crate::injector::Injector<M, C>,
    events: relay_storage::EventLog<C>,
    mut shutdown: Shutdown,
) {
    let mut last_mtime = file_mtime(&path);
    let mut ticker = tokio::time::interval(crate::env::pane_map_reload_ms());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.cancelled() => return,
        }

        let mtime = file_mtime(&path);
        if mtime == last_mtime {
            continue;
        }
        last_mtime = mtime;

        match relay_storage::load_pane_map(&path) {
            Ok(map) => {
                tracing::info!(version = map.version, "pane map reloaded");
                injector.update_targets(map.panes.clone());
                let version = map.version;
                *shared_map.write() = map;
                events.log_best_effort(
                    relay_core::EventRecord::new(relay_core::EventKind::PaneMapReloaded)
                        .count(version),
                );
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "pane map reload failed");
            }
        }
    }
}

fn file_mtime(path: &std::path::Path) -> Option<std::time::SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
