// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory change subscription with a polling fallback
//!
//! Two backends behind one surface: an inotify/kqueue watcher (via the
//! `notify` crate) and a polling scanner for platforms or filesystems
//! where native notification is unavailable. Both observe
//! create/write/remove/rename equivalently; a rename may surface as a
//! remove+create pair from the polling backend.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from watcher construction.
#[derive(Debug, Error)]
pub enum FsWatchError {
    #[error("watch setup failed: {0}")]
    Backend(String),
}

/// Kind of filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Create,
    Write,
    Remove,
    Rename,
}

/// One observed filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

enum Backend {
    NotifyBacked {
        // Held to keep the subscription alive; dropped on close.
        _watcher: Box<RecommendedWatcher>,
    },
    PollingBacked {
        // Dropping the sender stops the poll task.
        _shutdown: tokio::sync::oneshot::Sender<()>,
    },
}

/// A subscription on a directory tree.
///
/// `events` and `errors` are separate channels so a caller can treat
/// backend errors as fatal while draining events normally.
pub struct DirWatcher {
    _backend: Backend,
    pub events: mpsc::Receiver<FsEvent>,
    pub errors: mpsc::Receiver<String>,
}

impl DirWatcher {
    /// Native notification backend watching `dir` recursively.
    pub fn notify_backed(dir: &Path) -> Result<Self, FsWatchError> {
        let (event_tx, events) = mpsc::channel(256);
        let (error_tx, errors) = mpsc::channel(8);

        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                match res {
                    Ok(event) => {
                        let Some(kind) = map_notify_kind(&event.kind) else {
                            return;
                        };
                        for path in event.paths {
                            let _ = event_tx.blocking_send(FsEvent {
                                path,
                                kind,
                            });
                        }
                    }
                    Err(e) => {
                        let _ = error_tx.blocking_send(e.to_string());
                    }
                }
            })
            .map_err(|e| FsWatchError::Backend(e.to_string()))?;

        watcher
            .watch(dir, RecursiveMode::Recursive)
            .map_err(|e| FsWatchError::Backend(e.to_string()))?;

        Ok(Self {
            _backend: Backend::NotifyBacked {
                _watcher: Box::new(watcher),
            },
            events,
            errors,
        })
    }

    /// Polling backend scanning `dir` (and its subdirectories) every
    /// `interval`, producing equivalent create/write/remove events.
    pub fn polling(dir: &Path, interval: Duration) -> Self {
        let (event_tx, events) = mpsc::channel(256);
        let (error_tx, errors) = mpsc::channel(8);
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let dir = dir.to_path_buf();
        tokio::spawn(async move {
            // Held so the error channel stays open for the watcher's
            // lifetime; the scanner itself never reports fatal errors.
            let _error_tx = error_tx;
            let mut seen: HashMap<PathBuf, (u64, Option<std::time::SystemTime>)> = HashMap::new();
            // Prime without emitting: pre-existing files are the caller's
            // startup scan, not change events.
            scan_dir(&dir, &mut |path, meta| {
                seen.insert(path, meta);
            });

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => return,
                    _ = ticker.tick() => {}
                }

                let mut current: HashMap<PathBuf, (u64, Option<std::time::SystemTime>)> =
                    HashMap::new();
                scan_dir(&dir, &mut |path, meta| {
                    current.insert(path, meta);
                });

                for (path, meta) in &current {
                    match seen.get(path) {
                        None => {
                            if event_tx
                                .send(FsEvent {
                                    path: path.clone(),
                                    kind: FsEventKind::Create,
                                })
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        Some(old) if old != meta => {
                            if event_tx
                                .send(FsEvent {
                                    path: path.clone(),
                                    kind: FsEventKind::Write,
                                })
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        Some(_) => {}
                    }
                }

                for path in seen.keys() {
                    if !current.contains_key(path)
                        && event_tx
                            .send(FsEvent {
                                path: path.clone(),
                                kind: FsEventKind::Remove,
                            })
                            .await
                            .is_err()
                    {
                        return;
                    }
                }

                seen = current;
            }
        });

        Self {
            _backend: Backend::PollingBacked {
                _shutdown: shutdown_tx,
            },
            events,
            errors,
        }
    }

    /// Native backend if available, polling fallback otherwise.
    pub fn recommended(dir: &Path) -> Self {
        match Self::notify_backed(dir) {
            Ok(watcher) => watcher,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "native fs watcher unavailable, polling");
                Self::polling(dir, crate::env::fswatch_poll_ms())
            }
        }
    }
}

fn map_notify_kind(kind: &notify::EventKind) -> Option<FsEventKind> {
    use notify::event::ModifyKind;
    match kind {
        notify::EventKind::Create(_) => Some(FsEventKind::Create),
        notify::EventKind::Modify(ModifyKind::Name(_)) => Some(FsEventKind::Rename),
        notify::EventKind::Modify(_) => Some(FsEventKind::Write),
        notify::EventKind::Remove(_) => Some(FsEventKind::Remove),
        _ => None,
    }
}

/// Walk `dir` one level of subdirectories deep, reporting file metadata.
fn scan_dir(
    dir: &Path,
    visit: &mut impl FnMut(PathBuf, (u64, Option<std::time::SystemTime>)),
) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if meta.is_dir() {
            scan_files(&path, visit);
        } else {
            visit(path, (meta.len(), meta.modified().ok()));
        }
    }
}

fn scan_files(
    dir: &Path,
    visit: &mut impl FnMut(PathBuf, (u64, Option<std::time::SystemTime>)),
) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if meta.is_file() {
            visit(path, (meta.len(), meta.modified().ok()));
        }
    }
}

#[cfg(test)]
#[path = "fswatch_tests.rs"]
mod tests;
