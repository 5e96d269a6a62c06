// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane-map file IO

use crate::fsutil::write_json_atomic;
use crate::StorageError;
use relay_core::PaneMap;
use std::path::Path;

/// Load and parse the pane map (versioned or legacy flat form).
pub fn load_pane_map(path: &Path) -> Result<PaneMap, StorageError> {
    let text = std::fs::read_to_string(path)?;
    Ok(PaneMap::parse(&text)?)
}

/// Save the pane map in the versioned form, atomically.
pub fn save_pane_map(path: &Path, map: &PaneMap) -> Result<(), StorageError> {
    write_json_atomic(path, map)
}

#[cfg(test)]
#[path = "panes_tests.rs"]
mod tests;
