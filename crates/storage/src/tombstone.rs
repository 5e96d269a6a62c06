// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The last-exit tombstone
//!
//! Post-mortem record of the daemon's most recent exit. Must be written
//! on every exit path, including panics.

use crate::fsutil::write_json_atomic;
use crate::StorageError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Why the daemon exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Signal,
    Error,
    Panic,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Signal => "signal",
            ExitReason::Error => "error",
            ExitReason::Panic => "panic",
        }
    }
}

/// Contents of `<state>/last-exit.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    /// RFC-3339 UTC exit time.
    pub timestamp: String,
    pub reason: ExitReason,
    pub detail: String,
    pub pid: u32,
    pub uptime_seconds: u64,
}

impl Tombstone {
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        write_json_atomic(path, self)
    }

    pub fn load(path: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&text).ok()
    }
}

#[cfg(test)]
#[path = "tombstone_tests.rs"]
mod tests;
