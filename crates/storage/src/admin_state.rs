// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted admin coordinator state and counters

use crate::fsutil::write_json_atomic;
use crate::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Durable slice of the checkpoint coordinator's state.
///
/// Epoch milliseconds throughout; zero means "never". Pending requests
/// are deliberately not persisted — a restart re-triggers or times out
/// naturally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminState {
    #[serde(default)]
    pub last_relay_activity_ms: u64,
    #[serde(default)]
    pub last_log_growth_ms: HashMap<String, u64>,
    #[serde(default)]
    pub last_checkpoint_time_ms: HashMap<String, u64>,
    #[serde(default)]
    pub cooldown_until_ms: HashMap<String, u64>,
}

impl AdminState {
    /// Load from `path`; a missing or corrupt file is a default state.
    pub fn load(path: &Path) -> Self {
        load_or_default(path, "admin state")
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        write_json_atomic(path, self)
    }
}

/// Counters mirrored to `admin-metrics.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminMetrics {
    #[serde(default)]
    pub checkpoint_requests: u64,
    #[serde(default)]
    pub checkpoint_acks: u64,
    #[serde(default)]
    pub checkpoint_timeouts: u64,
    #[serde(default)]
    pub autogen_runs: u64,
    #[serde(default)]
    pub beads_written: u64,
    #[serde(default)]
    pub bead_failures: u64,
    #[serde(default)]
    pub health_checks: u64,
    #[serde(default)]
    pub recycles: u64,
}

impl AdminMetrics {
    pub fn load(path: &Path) -> Self {
        load_or_default(path, "admin metrics")
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        write_json_atomic(path, self)
    }
}

fn load_or_default<T: Default + for<'de> Deserialize<'de>>(path: &Path, what: &str) -> T {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt {what} file, starting fresh");
                T::default()
            }
        },
        Err(_) => T::default(),
    }
}

#[cfg(test)]
#[path = "admin_state_tests.rs"]
mod tests;
