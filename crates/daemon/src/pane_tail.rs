// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional pane-tail debug capture
//!
//! Periodically appends each mapped pane's tail to a per-role file.
//! Off by default; a debugging aid, never load-bearing.

use crate::lifecycle::Shutdown;
use parking_lot::RwLock;
use relay_adapters::MuxAdapter;
use relay_core::{PaneMap, PaneTailConfig};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Rotate a capture file once it passes this size.
const ROTATE_BYTES: u64 = 256 * 1024;

/// Capture pane tails until shutdown. Returns immediately when disabled
/// or unconfigured.
pub async fn run_pane_tailer<M: MuxAdapter>(
    mux: M,
    pane_map: Arc<RwLock<PaneMap>>,
    config: PaneTailConfig,
    mut shutdown: Shutdown,
) {
    let Some(dir) = config.dir.clone() else {
        return;
    };
    if !config.enabled {
        return;
    }
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "pane tail dir unavailable");
        return;
    }

    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.cancelled() => return,
        }

        let panes: Vec<_> = pane_map
            .read()
            .panes
            .iter()
            .map(|(role, pane)| (role.clone(), pane.clone()))
            .collect();

        for (role, pane) in panes {
            let tail = match mux.capture_tail(&pane, config.lines).await {
                Ok(tail) => tail,
                Err(e) => {
                    tracing::debug!(role = %role, error = %e, "pane tail capture failed");
                    continue;
                }
            };
            let path = dir.join(format!("{role}.txt"));
            rotate_if_needed(&path, config.rotations);
            if let Err(e) = append_capture(&path, &tail) {
                tracing::debug!(role = %role, error = %e, "pane tail write failed");
            }
        }
    }
}

fn append_capture(path: &Path, tail: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "--- capture ---")?;
    writeln!(file, "{}", tail.trim_end())?;
    Ok(())
}

/// Shift `file` → `.1` → `.2` … keeping `rotations` old captures.
fn rotate_if_needed(path: &Path, rotations: u32) {
    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => return,
    };
    if size < ROTATE_BYTES || rotations == 0 {
        return;
    }

    let base = path.display().to_string();
    for i in (1..rotations).rev() {
        let _ = std::fs::rename(format!("{base}.{i}"), format!("{base}.{}", i + 1));
    }
    let _ = std::fs::rename(path, format!("{base}.1"));
}

#[cfg(test)]
#[path = "pane_tail_tests.rs"]
mod tests;
