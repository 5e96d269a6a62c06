// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbox watcher
//!
//! Turns bytes appended to per-role inbox files into parsed envelopes,
//! exactly once per observed byte range, across restarts. Two layouts:
//! flat (`<inbox>/<role>.jsonl`, one JSONL envelope per line) and nested
//! (`<inbox>/<role>/<id>.rmf`, one message per file).

use crate::lifecycle::{Fatal, Shutdown};
use relay_adapters::{DirWatcher, FsEventKind};
use relay_core::{
    parse_jsonl_line, parse_rmf, Clock, Envelope, EventKind, EventRecord, Role,
};
use relay_storage::{EventLog, OffsetStore};
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Observes the inbox directory and publishes envelopes.
pub struct InboxWatcher<C: Clock> {
    inbox_dir: PathBuf,
    roles: Vec<Role>,
    offsets: OffsetStore,
    remainders: HashMap<PathBuf, String>,
    events: EventLog<C>,
    clock: C,
    tx: mpsc::Sender<Envelope>,
}

impl<C: Clock> InboxWatcher<C> {
    pub fn new(
        inbox_dir: PathBuf,
        roles: Vec<Role>,
        offsets: OffsetStore,
        events: EventLog<C>,
        clock: C,
        tx: mpsc::Sender<Envelope>,
    ) -> Self {
        Self {
            inbox_dir,
            roles,
            offsets,
            remainders: HashMap::new(),
            events,
            clock,
            tx,
        }
    }

    /// Watch until shutdown. A fatal backend error is reported on
    /// `fatal_tx` and terminates the watcher; per-file errors never do.
    pub async fn run(
        mut self,
        mut watcher: DirWatcher,
        mut shutdown: Shutdown,
        fatal_tx: mpsc::Sender<Fatal>,
    ) {
        // Catch up on bytes that appeared while the daemon was down.
        for path in existing_files(&self.inbox_dir) {
            self.read_new(&path).await;
        }
        self.persist_offsets();

        loop {
            tokio::select! {
                event = watcher.events.recv() => {
                    match event {
                        Some(event) => {
                            match event.kind {
                                FsEventKind::Create | FsEventKind::Write => {
                                    self.read_new(&event.path).await;
                                    self.persist_offsets();
                                }
                                FsEventKind::Remove | FsEventKind::Rename => {
                                    self.offsets.remove(&event.path);
                                    self.remainders.remove(&event.path);
                                    self.persist_offsets();
                                }
                            }
                        }
                        None => {
                            let _ = fatal_tx
                                .send(Fatal::error("inbox watcher event stream closed"))
                                .await;
                            return;
                        }
                    }
                }
                error = watcher.errors.recv() => {
                    if let Some(error) = error {
                        let _ = fatal_tx
                            .send(Fatal::error(format!("inbox watch backend: {error}")))
                            .await;
                        return;
                    }
                }
                _ = shutdown.cancelled() => {
                    self.persist_offsets();
                    return;
                }
            }
        }
    }

    /// Consume bytes past the stored offset of one file.
    pub async fn read_new(&mut self, path: &Path) {
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "inbox stat failed");
                return;
            }
        };
        if meta.is_dir() {
            return;
        }

        let Some(role) = self.role_for(path) else {
            tracing::warn!(path = %path.display(), "inbox file outside role allow-list, skipping");
            return;
        };

        let size = meta.len();
        let mut offset = self.offsets.get(path);
        if size < offset {
            // Rotation or truncation: restart from the top, drop the
            // buffered partial line.
            tracing::info!(path = %path.display(), offset, size, "inbox file shrank, resetting offset");
            offset = 0;
            self.remainders.remove(path);
        }
        if size == offset {
            return;
        }

        let chunk = match read_from(path, offset) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "inbox read failed");
                return;
            }
        };
        let bytes_read = chunk.len() as u64;
        let text = String::from_utf8_lossy(&chunk).to_string();

        if path.parent() == Some(self.inbox_dir.as_path()) {
            self.consume_lines(path, &role, text).await;
        } else {
            self.consume_message_file(&role, &text).await;
        }

        self.offsets.set(path, offset + bytes_read);
    }

    /// Flat layout: newline-delimited JSONL with a partial-line buffer.
    async fn consume_lines(&mut self, path: &Path, role: &Role, chunk: String) {
        let mut buffer = self.remainders.remove(path).unwrap_or_default();
        buffer.push_str(&chunk);

        let ends_complete = buffer.ends_with('\n');
        let mut lines: Vec<&str> = buffer.split('\n').collect();
        let tail = if ends_complete {
            None
        } else {
            lines.pop().filter(|l| !l.is_empty()).map(str::to_string)
        };

        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_jsonl_line(line, Some(role), &self.clock) {
                Ok(envelope) => self.publish(envelope).await,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "envelope parse error");
                    self.events.log_best_effort(
                        EventRecord::new(EventKind::ParseError)
                            .from_role(role.clone())
                            .error(e.to_string()),
                    );
                }
            }
        }

        if let Some(tail) = tail {
            self.remainders.insert(path.to_path_buf(), tail);
        }
    }

    /// Nested layout: the whole file is one message, JSONL or RMF by
    /// leading character.
    async fn consume_message_file(&mut self, role: &Role, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        let parsed = if trimmed.starts_with('{') {
            parse_jsonl_line(trimmed, Some(role), &self.clock)
        } else {
            parse_rmf(text, Some(role), &self.clock)
        };
        match parsed {
            Ok(envelope) => self.publish(envelope).await,
            Err(e) => {
                tracing::warn!(role = %role, error = %e, "envelope parse error");
                self.events.log_best_effort(
                    EventRecord::new(EventKind::ParseError)
                        .from_role(role.clone())
                        .error(e.to_string()),
                );
            }
        }
    }

    /// Non-blocking publish; a full channel drops with an event rather
    /// than stalling the watcher.
    async fn publish(&mut self, envelope: Envelope) {
        match self.tx.try_send(envelope) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(envelope)) => {
                tracing::warn!(msg_id = %envelope.msg_id, "envelope channel full, dropping");
                self.events.log_best_effort(
                    EventRecord::new(EventKind::InboxDrop)
                        .from_role(envelope.from.clone())
                        .msg(envelope.msg_id.clone()),
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("envelope channel closed");
            }
        }
    }

    /// Role from the file name (flat) or parent directory (nested),
    /// checked against the allow-list.
    fn role_for(&self, path: &Path) -> Option<Role> {
        let name = if path.parent() == Some(self.inbox_dir.as_path()) {
            path.file_stem()?.to_string_lossy().to_string()
        } else {
            path.parent()?.file_name()?.to_string_lossy().to_string()
        };
        let role = Role::normalized(&name);
        self.roles.contains(&role).then_some(role)
    }

    fn persist_offsets(&self) {
        if let Err(e) = self.offsets.save() {
            tracing::warn!(error = %e, "failed to persist inbox offsets");
        }
    }
}

/// Every file currently under the inbox (flat files and one directory
/// level of role subdirectories).
fn existing_files(inbox_dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(inbox_dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Ok(nested) = std::fs::read_dir(&path) {
                for sub in nested.flatten() {
                    if sub.path().is_file() {
                        files.push(sub.path());
                    }
                }
            }
        } else {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// Read from `offset` to EOF.
fn read_from(path: &Path, offset: u64) -> std::io::Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
#[path = "inbox_tests.rs"]
mod tests;
