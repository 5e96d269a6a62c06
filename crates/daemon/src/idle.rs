// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idle detection for the checkpoint cycle ticker
//!
//! All agents count as idle iff every project dir's newest session log
//! predates the last checkpoint injection plus a grace window, and at
//! least one injection has happened. A backstop fires when the interval
//! since the last injection grows too long, overriding the idle skip.

use indexmap::IndexMap;
use parking_lot::Mutex;
use relay_core::{Clock, Role};
use std::path::PathBuf;
use std::time::Duration;

/// Grace window added to the last injection time.
const IDLE_GRACE: Duration = Duration::from_secs(2 * 60);

/// What the cycle ticker should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleStatus {
    /// Some agent wrote recently; run the cycle.
    Active,
    /// Everything is quiet; skip the cycle.
    AllIdle,
    /// Too long since the last injection; run regardless.
    Backstop,
}

/// Watches per-role project dirs for activity.
pub struct IdleDetector<C: Clock> {
    project_dirs: IndexMap<Role, PathBuf>,
    backstop: Duration,
    clock: C,
    last_injection_ms: Mutex<u64>,
}

impl<C: Clock> IdleDetector<C> {
    pub fn new(project_dirs: IndexMap<Role, PathBuf>, backstop: Duration, clock: C) -> Self {
        Self {
            project_dirs,
            backstop,
            clock,
            last_injection_ms: Mutex::new(0),
        }
    }

    /// Record a checkpoint cycle injection.
    pub fn note_injection(&self) {
        *self.last_injection_ms.lock() = self.clock.epoch_ms();
    }

    pub fn status(&self) -> IdleStatus {
        let now = self.clock.epoch_ms();
        let last_injection = *self.last_injection_ms.lock();

        if last_injection == 0 {
            // Idle skip requires at least one prior injection.
            return IdleStatus::Active;
        }
        if now.saturating_sub(last_injection) >= self.backstop.as_millis() as u64 {
            return IdleStatus::Backstop;
        }

        let cutoff = last_injection + IDLE_GRACE.as_millis() as u64;
        let all_idle = self.project_dirs.values().all(|dir| {
            match newest_jsonl_mtime_ms(dir) {
                Some(mtime) => mtime < cutoff,
                // No log at all reads as idle.
                None => true,
            }
        });

        if all_idle {
            IdleStatus::AllIdle
        } else {
            IdleStatus::Active
        }
    }
}

/// Epoch-ms mtime of the most recently modified `*.jsonl` under `dir`.
fn newest_jsonl_mtime_ms(dir: &std::path::Path) -> Option<u64> {
    crate::session_map::find_newest_jsonl(dir)
        .and_then(|path| std::fs::metadata(path).ok())
        .and_then(|meta| meta.modified().ok())
        .and_then(|mtime| mtime.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
}

#[cfg(test)]
#[path = "idle_tests.rs"]
mod tests;
