// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Terminal echo settle time after pasting into a pane (default: 1500ms).
pub fn echo_wait_ms() -> Duration {
    parse_duration_ms("RELAY_ECHO_WAIT_MS").unwrap_or(Duration::from_millis(1500))
}

/// Spacing between Enter-key retries (default: 200ms).
pub fn enter_retry_ms() -> Duration {
    parse_duration_ms("RELAY_ENTER_RETRY_MS").unwrap_or(Duration::from_millis(200))
}

/// Polling fallback interval for the directory watcher (default: 500ms).
pub fn fswatch_poll_ms() -> Duration {
    parse_duration_ms("RELAY_FSWATCH_POLL_MS").unwrap_or(Duration::from_millis(500))
}

/// Base delay for LLM summarizer retry backoff (default: 500ms).
pub fn llm_backoff_base_ms() -> Duration {
    parse_duration_ms("RELAY_LLM_BACKOFF_MS").unwrap_or(Duration::from_millis(500))
}
