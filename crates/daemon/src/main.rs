// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! relayd: the pod relay daemon binary

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use relay_adapters::{BdCli, DirWatcher, HttpSummarizer, PaneSender, SendOptions, TmuxAdapter};
use relay_core::{PaneMap, RelayConfig, SystemClock};
use relay_storage::{load_pane_map, EventLog, ExitReason, OffsetStore, sweep_session_maps};
use relay_daemon::admin::{run_log_watchers, AdminCoordinator};
use relay_daemon::idle::IdleDetector;
use relay_daemon::inbox::InboxWatcher;
use relay_daemon::injector::Injector;
use relay_daemon::lifecycle::{
    self, spawn_guarded, Fatal, LifecycleError, Paths, Shutdown,
};
use relay_daemon::pane_tail::run_pane_tailer;
use relay_daemon::recycler::{AdminTimer, AdminTimerDeps};
use relay_daemon::router::Router;
use relay_daemon::session_map::SessionMapService;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("relayd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("relayd {}", env!("CARGO_PKG_VERSION"));
                println!("Pod relay daemon - routes messages between pod agents in tmux panes");
                println!();
                println!("USAGE:");
                println!("    relayd");
                println!();
                println!("All configuration comes from RELAY_* environment variables;");
                println!("see the repository documentation for the full option table.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: relayd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = RelayConfig::from_env()?;
    let paths = Paths::new(&config);

    rotate_log_if_needed(&paths.daemon_log);
    let log_guard = setup_logging(&paths)?;

    info!("starting relay daemon");
    match run(config, paths).await {
        Ok(()) => Ok(()),
        Err(LifecycleError::LockContended { path }) => {
            eprintln!("relayd is already running (lock held at {})", path.display());
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to run relay daemon: {e}");
            drop(log_guard);
            Err(e.into())
        }
    }
}

async fn run(config: RelayConfig, paths: Paths) -> Result<(), LifecycleError> {
    let start_time = Instant::now();
    let clock = SystemClock;

    // 1. Exclusive lock, then the stale-state sweep and pid file.
    let _lock_file = lifecycle::acquire_lock(&paths.lock)?;
    let swept = sweep_session_maps(&config.state_dir);
    if swept > 0 {
        info!(swept, "swept stale session maps");
    }
    lifecycle::write_pid(&paths.pid)?;

    // 2. Pane map; an unreadable file falls back to the default layout.
    let pane_map = match load_pane_map(&paths.pane_map) {
        Ok(map) => map,
        Err(e) => {
            warn!(path = %paths.pane_map.display(), error = %e, "pane map unreadable, using default");
            PaneMap::fallback_default()
        }
    };
    let shared_map = Arc::new(RwLock::new(pane_map.clone()));

    // 3. Capability objects and the event log.
    let mux = TmuxAdapter::new();
    let sender = PaneSender::new(
        mux.clone(),
        SendOptions::new(config.tmux_session.clone(), config.vim_mode),
    );
    let events = EventLog::new(paths.events.clone(), clock.clone());
    let beads = BdCli::from_env();
    let summarizer = config.llm.clone().map(HttpSummarizer::new);
    let config = Arc::new(config);

    let injector = Injector::new(
        &config.roles,
        pane_map.panes.clone(),
        sender.clone(),
        events.clone(),
        clock.clone(),
        config.prompt_gating,
        config.queue_max_age,
    );

    let admin = AdminCoordinator::new(
        injector.clone(),
        beads,
        summarizer,
        events.clone(),
        clock.clone(),
        Arc::clone(&config),
        paths.admin_state.clone(),
        paths.admin_metrics.clone(),
    );
    admin.load_state();
    admin.seed_from_beads().await;

    let session_map = SessionMapService::new(
        Arc::clone(&config),
        admin.clone(),
        mux.clone(),
        clock.clone(),
    );

    // 4. Channels and the shared cancellation signal.
    let (env_tx, env_rx) = mpsc::channel(256);
    let (fatal_tx, mut fatal_rx) = mpsc::channel::<Fatal>(8);
    let (shutdown_handle, shutdown) = Shutdown::new();

    // 5. Long-lived activities, each under a panic guard.
    std::fs::create_dir_all(&config.inbox_dir)?;
    let watcher = DirWatcher::recommended(&config.inbox_dir);
    let inbox = InboxWatcher::new(
        config.inbox_dir.clone(),
        config.roles.clone(),
        OffsetStore::load(&paths.offsets),
        events.clone(),
        clock.clone(),
        env_tx,
    );
    spawn_guarded(
        "inbox-watcher",
        fatal_tx.clone(),
        inbox.run(watcher, shutdown.clone(), fatal_tx.clone()),
    );

    injector.start(&shutdown, fatal_tx.clone());

    let router = Router::new(injector.clone(), admin.clone(), config.roles.clone());
    spawn_guarded(
        "router",
        fatal_tx.clone(),
        router.run(env_rx, shutdown.clone()),
    );

    spawn_guarded(
        "admin-coordinator",
        fatal_tx.clone(),
        admin.clone().run(shutdown.clone()),
    );
    spawn_guarded(
        "session-log-watcher",
        fatal_tx.clone(),
        run_log_watchers(admin.clone(), shutdown.clone()),
    );
    spawn_guarded(
        "session-map",
        fatal_tx.clone(),
        session_map.clone().run(shutdown.clone()),
    );

    let idle = IdleDetector::new(
        config.worktrees.clone(),
        config.idle_backstop_interval,
        clock.clone(),
    );
    let timer = AdminTimer::new(AdminTimerDeps {
        injector: injector.clone(),
        sender: sender.clone(),
        admin: admin.clone(),
        session_map,
        events: events.clone(),
        clock: clock.clone(),
        config: Arc::clone(&config),
        pane_map: Arc::clone(&shared_map),
        pane_map_path: paths.pane_map.clone(),
        last_life_path: paths.last_life.clone(),
        idle,
    });
    spawn_guarded("admin-timer", fatal_tx.clone(), timer.run(shutdown.clone()));

    spawn_guarded(
        "pane-map-reloader",
        fatal_tx.clone(),
        lifecycle::pane_map_reloader(
            paths.pane_map.clone(),
            Arc::clone(&shared_map),
            injector.clone(),
            events.clone(),
            shutdown.clone(),
        ),
    );

    if config.pane_tail.enabled {
        spawn_guarded(
            "pane-tailer",
            fatal_tx.clone(),
            run_pane_tailer(
                mux.clone(),
                Arc::clone(&shared_map),
                config.pane_tail.clone(),
                shutdown.clone(),
            ),
        );
    }

    // 6. Signal-driven shutdown, or the first fatal error.
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    info!("relay daemon ready");

    let (reason, detail) = tokio::select! {
        _ = sigint.recv() => (ExitReason::Signal, "SIGINT".to_string()),
        _ = sigterm.recv() => (ExitReason::Signal, "SIGTERM".to_string()),
        _ = sighup.recv() => (ExitReason::Signal, "SIGHUP".to_string()),
        fatal = fatal_rx.recv() => match fatal {
            Some(fatal) => (fatal.reason, fatal.detail),
            None => (ExitReason::Error, "fatal channel closed".to_string()),
        },
    };

    info!(reason = reason.as_str(), detail, "shutting down");
    shutdown_handle.cancel();

    // Give the watchers a moment to persist offsets and state.
    tokio::time::sleep(Duration::from_millis(500)).await;
    admin.persist();

    lifecycle::write_tombstone(&paths, &clock, start_time, reason, &detail);
    let _ = std::fs::remove_file(&paths.pid);

    info!("relay daemon stopped");
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log at startup if it has grown too large.
///
/// Shifts `relay-daemon.log` → `.1` → `.2` → `.3`, deleting the oldest.
/// Best-effort: rotation failures must not stop the daemon.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let _ = std::fs::rename(format!("{log_str}.{i}"), format!("{log_str}.{}", i + 1));
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    paths: &Paths,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = paths
        .daemon_log
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;
    let file_name = paths
        .daemon_log
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_else(|| "relay-daemon.log".into());

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
