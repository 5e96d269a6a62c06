// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-log growth watcher
//!
//! Polls each role's session log and marks growth on the coordinator so
//! the log-stable checkpoint gate can hold requests back while an agent
//! is still producing output.

use super::AdminCoordinator;
use crate::lifecycle::Shutdown;
use relay_adapters::{BeadStore, MuxAdapter, Summarizer};
use relay_core::{Clock, Role};
use std::collections::HashMap;
use std::time::SystemTime;

#[derive(Clone, Copy, PartialEq, Eq)]
struct LogStamp {
    size: u64,
    mtime: Option<SystemTime>,
}

/// Poll session logs until shutdown, noting growth on the coordinator.
pub async fn run_log_watchers<M, B, S, C>(
    admin: AdminCoordinator<M, B, S, C>,
    mut shutdown: Shutdown,
) where
    M: MuxAdapter,
    B: BeadStore,
    S: Summarizer,
    C: Clock,
{
    let mut stamps: HashMap<Role, LogStamp> = HashMap::new();
    let mut ticker = tokio::time::interval(crate::env::log_watch_ms());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.cancelled() => return,
        }

        for (role, path) in admin.session_logs() {
            let stamp = match std::fs::metadata(&path) {
                Ok(meta) => LogStamp {
                    size: meta.len(),
                    mtime: meta.modified().ok(),
                },
                Err(e) => {
                    tracing::debug!(role = %role, path = %path.display(), error = %e, "session log stat failed");
                    continue;
                }
            };

            match stamps.get(&role) {
                Some(previous) if *previous == stamp => {}
                Some(_) => {
                    admin.note_log_growth(&role);
                    stamps.insert(role, stamp);
                }
                None => {
                    // First observation is a baseline, not growth.
                    stamps.insert(role, stamp);
                }
            }
        }
    }
}
