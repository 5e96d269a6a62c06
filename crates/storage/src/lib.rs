// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-storage: durable state files for the pod relay daemon
//!
//! Every persisted file (offsets, admin state, tombstone, session map,
//! pane map) is replaced atomically via temp-file + rename.

pub mod admin_state;
pub mod event_log;
pub mod fsutil;
pub mod offsets;
pub mod panes;
pub mod session_map;
pub mod tombstone;

pub use admin_state::{AdminMetrics, AdminState};
pub use event_log::{read_events, EventLog};
pub use fsutil::{write_atomic, write_json_atomic};
pub use offsets::OffsetStore;
pub use panes::{load_pane_map, save_pane_map};
pub use session_map::{session_map_path, sweep_session_maps, SessionMapFile};
pub use tombstone::{ExitReason, Tombstone};

use thiserror::Error;

/// Errors from storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pane map error: {0}")]
    PaneMap(#[from] relay_core::PaneMapError),
}
