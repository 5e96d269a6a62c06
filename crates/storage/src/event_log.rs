// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-writer append-only event log
//!
//! All writes are serialized under one mutex; ordering on disk matches
//! the order of successful `log` calls.

use crate::StorageError;
use parking_lot::Mutex;
use relay_core::{Clock, EventId, EventRecord, EVENT_SCHEMA_VERSION};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Append-only JSONL sink for event records.
#[derive(Clone)]
pub struct EventLog<C: Clock> {
    path: PathBuf,
    clock: C,
    writer: Arc<Mutex<()>>,
}

impl<C: Clock> EventLog<C> {
    pub fn new(path: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            path: path.into(),
            clock,
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, auto-filling `v`, `ts_ms`, and `event_id`.
    pub fn log(&self, mut record: EventRecord) -> Result<(), StorageError> {
        record.v.get_or_insert(EVENT_SCHEMA_VERSION);
        if record.ts_ms.is_none() {
            record.ts_ms = Some(self.clock.epoch_ms());
        }
        if record.event_id.is_none() {
            record.event_id = Some(EventId::generate());
        }

        let line = serde_json::to_string(&record)?;

        let _guard = self.writer.lock();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Append, logging instead of propagating failure.
    ///
    /// The event log is an observability artifact; a full disk must not
    /// take the relay down.
    pub fn log_best_effort(&self, record: EventRecord) {
        if let Err(e) = self.log(record) {
            tracing::warn!(path = %self.path.display(), error = %e, "event log write failed");
        }
    }
}

/// Read every parseable record from an event log file.
///
/// Unparseable lines are skipped. Intended for tooling and tests.
pub fn read_events(path: &Path) -> Vec<EventRecord> {
    let Ok(text) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    text.lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
