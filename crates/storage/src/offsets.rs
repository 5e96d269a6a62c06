// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted inbox consumption offsets
//!
//! Maps absolute file path to bytes consumed. Values never exceed the
//! file's current size: the watcher resets to 0 when a file shrinks.

use crate::fsutil::write_json_atomic;
use crate::StorageError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Offset map with its backing file.
#[derive(Debug, Clone)]
pub struct OffsetStore {
    path: PathBuf,
    offsets: HashMap<PathBuf, u64>,
}

impl OffsetStore {
    /// Load from `path`. A missing file is an empty store; a corrupt one
    /// is logged and treated as empty (the watcher re-reads from zero,
    /// which duplicates rather than loses).
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let offsets = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<HashMap<String, u64>>(&text) {
                Ok(map) => map.into_iter().map(|(k, v)| (PathBuf::from(k), v)).collect(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt offsets file, starting fresh");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, offsets }
    }

    pub fn get(&self, file: &Path) -> u64 {
        self.offsets.get(file).copied().unwrap_or(0)
    }

    pub fn set(&mut self, file: &Path, offset: u64) {
        self.offsets.insert(file.to_path_buf(), offset);
    }

    /// Drop the offset for a removed or renamed file.
    pub fn remove(&mut self, file: &Path) {
        self.offsets.remove(file);
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Persist atomically (temp-file + rename).
    pub fn save(&self) -> Result<(), StorageError> {
        let map: HashMap<String, u64> = self
            .offsets
            .iter()
            .map(|(k, v)| (k.display().to_string(), *v))
            .collect();
        write_json_atomic(&self.path, &map)
    }
}

#[cfg(test)]
#[path = "offsets_tests.rs"]
mod tests;
