// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Admin coordinator tick interval (default: 5000ms).
pub fn admin_tick_ms() -> Duration {
    parse_duration_ms("RELAY_ADMIN_TICK_MS").unwrap_or(Duration::from_secs(5))
}

/// Admin state persistence interval (default: 60s).
pub fn admin_persist_ms() -> Duration {
    parse_duration_ms("RELAY_ADMIN_PERSIST_MS").unwrap_or(Duration::from_secs(60))
}

/// Session-log growth poll interval (default: 10s).
pub fn log_watch_ms() -> Duration {
    parse_duration_ms("RELAY_LOG_WATCH_MS").unwrap_or(Duration::from_secs(10))
}

/// Session-map revalidation interval (default: 5 minutes).
pub fn session_map_refresh_ms() -> Duration {
    parse_duration_ms("RELAY_SESSION_MAP_REFRESH_MS").unwrap_or(Duration::from_secs(5 * 60))
}

/// Pane-map mtime poll interval for hot reload (default: 2s).
pub fn pane_map_reload_ms() -> Duration {
    parse_duration_ms("RELAY_PANE_MAP_RELOAD_MS").unwrap_or(Duration::from_secs(2))
}

/// Wait after injecting `/register-panes` before reloading the map
/// (default: 3s).
pub fn register_panes_wait_ms() -> Duration {
    parse_duration_ms("RELAY_REGISTER_PANES_WAIT_MS").unwrap_or(Duration::from_secs(3))
}

/// Recycle prompt-wait poll interval (default: 1s) and attempt count
/// (default: 30).
pub fn recycle_poll_ms() -> Duration {
    parse_duration_ms("RELAY_RECYCLE_POLL_MS").unwrap_or(Duration::from_secs(1))
}

pub fn recycle_poll_attempts() -> u32 {
    std::env::var("RELAY_RECYCLE_POLL_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30)
}
