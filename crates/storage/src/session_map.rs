// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted session-log discovery results

use crate::fsutil::write_json_atomic;
use crate::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Contents of `<state>/session-map-<pod>.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMapFile {
    pub pod: String,
    /// role → session-log absolute path
    #[serde(default)]
    pub logs: HashMap<String, PathBuf>,
    #[serde(default)]
    pub refreshed_at: String,
}

impl SessionMapFile {
    pub fn load(path: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&text) {
            Ok(map) => Some(map),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt session map, rediscovering");
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        write_json_atomic(path, self)
    }
}

/// Path of the session map for one pod.
pub fn session_map_path(state_dir: &Path, pod: &str) -> PathBuf {
    state_dir.join(format!("session-map-{pod}.json"))
}

/// Remove every `session-map-*.json` under `state_dir`.
///
/// Discovery re-runs at startup, so stale maps from old pods are noise.
/// Returns the number of files removed.
pub fn sweep_session_maps(state_dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(state_dir) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("session-map-") && name.ends_with(".json") {
            if std::fs::remove_file(entry.path()).is_ok() {
                removed += 1;
            }
        }
    }
    removed
}

#[cfg(test)]
#[path = "session_map_tests.rs"]
mod tests;
