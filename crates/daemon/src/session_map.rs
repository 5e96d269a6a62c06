// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-log discovery
//!
//! Maps each role to its agent's session-log file. Claude-style roles
//! encode the worktree path into a projects directory name; codex-style
//! roles are found through the pane shell's open files, falling back to
//! a walk of the sessions tree.

use crate::admin::AdminCoordinator;
use crate::lifecycle::Shutdown;
use relay_adapters::subprocess::{run_with_timeout, LSOF_TIMEOUT};
use relay_adapters::{BeadStore, MuxAdapter, Summarizer};
use relay_core::{Clock, RelayConfig, Role};
use relay_storage::{session_map_path, SessionMapFile};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;

/// Discovers and persists the role→session-log map.
pub struct SessionMapService<M: MuxAdapter, B: BeadStore, S: Summarizer, C: Clock> {
    config: Arc<RelayConfig>,
    admin: AdminCoordinator<M, B, S, C>,
    mux: M,
    clock: C,
}

impl<M: MuxAdapter, B: BeadStore, S: Summarizer, C: Clock> Clone
    for SessionMapService<M, B, S, C>
{
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            admin: self.admin.clone(),
            mux: self.mux.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<M, B, S, C> SessionMapService<M, B, S, C>
where
    M: MuxAdapter,
    B: BeadStore,
    S: Summarizer,
    C: Clock,
{
    pub fn new(
        config: Arc<RelayConfig>,
        admin: AdminCoordinator<M, B, S, C>,
        mux: M,
        clock: C,
    ) -> Self {
        Self {
            config,
            admin,
            mux,
            clock,
        }
    }

    /// Run discovery, publish the result to the coordinator, and persist
    /// it. Roles without a discoverable log are simply absent.
    pub async fn refresh(&self) {
        let mut logs: HashMap<Role, PathBuf> = HashMap::new();

        for role in &self.config.roles {
            let Some(worktree) = self.config.worktrees.get(role) else {
                continue;
            };
            let found = if self.config.claude_style_roles.contains(role) {
                find_claude_log(worktree, &claude_base_dir())
            } else if self.config.codex_style_roles.contains(role) {
                self.find_codex_log(role).await
            } else {
                None
            };
            match found {
                Some(path) => {
                    tracing::debug!(role = %role, path = %path.display(), "session log discovered");
                    logs.insert(role.clone(), path);
                }
                None => {
                    tracing::debug!(role = %role, worktree = %worktree.display(), "no session log found");
                }
            }
        }

        self.admin.set_session_logs(logs.clone());

        let file = SessionMapFile {
            pod: self.config.tmux_session.clone(),
            logs: logs
                .into_iter()
                .map(|(role, path)| (role.as_str().to_string(), path))
                .collect(),
            refreshed_at: self.clock.rfc3339(),
        };
        let path = session_map_path(&self.config.state_dir, &self.config.tmux_session);
        if let Err(e) = file.save(&path) {
            tracing::warn!(error = %e, "failed to persist session map");
        }
    }

    /// Periodic revalidation loop. A recycle elsewhere calls `refresh`
    /// directly; this loop catches log rollover in between.
    pub async fn run(self, mut shutdown: Shutdown) {
        self.refresh().await;
        let mut ticker = tokio::time::interval(crate::env::session_map_refresh_ms());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it, refresh already ran.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => self.refresh().await,
                _ = shutdown.cancelled() => return,
            }
        }
    }

    /// Codex-style discovery: `lsof` on the pane shell pid and its
    /// children, then a walk of the sessions tree by mtime.
    async fn find_codex_log(&self, role: &Role) -> Option<PathBuf> {
        // The injector owns the live role→pane snapshot.
        if let Some(pane) = self.admin.injector().resolve(role) {
            if let Ok(pid) = self.mux.display(&pane, "#{pane_pid}").await {
                let pid = pid.trim().to_string();
                if !pid.is_empty() {
                    if let Some(path) = lsof_codex_log(&pid).await {
                        return Some(path);
                    }
                }
            }
        }
        find_newest_jsonl(&codex_sessions_dir())
    }
}

/// `$CLAUDE_CONFIG_DIR` or `~/.claude`.
fn claude_base_dir() -> PathBuf {
    std::env::var("CLAUDE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::home_dir().unwrap_or_default().join(".claude"))
}

/// `$CODEX_HOME` or `~/.codex`, plus `sessions`.
fn codex_sessions_dir() -> PathBuf {
    std::env::var("CODEX_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::home_dir().unwrap_or_default().join(".codex"))
        .join("sessions")
}

/// Find the newest session log for a worktree under the claude projects
/// layout, trying each known encoding of the path.
pub fn find_claude_log(worktree: &Path, claude_base: &Path) -> Option<PathBuf> {
    let projects = claude_base.join("projects");
    encoded_candidates(worktree)
        .into_iter()
        .filter_map(|candidate| newest_jsonl_in(&projects.join(candidate)))
        .max_by_key(|(mtime, _)| *mtime)
        .map(|(_, path)| path)
}

/// Known encodings of a worktree path into a projects directory name:
/// `/`→`-`, optionally `_`→`-` and `.`→`-`, with and without the
/// leading dash.
pub fn encoded_candidates(worktree: &Path) -> Vec<String> {
    let canonical = std::fs::canonicalize(worktree).unwrap_or_else(|_| worktree.to_path_buf());
    let raw = canonical.to_string_lossy();

    let base = raw.replace('/', "-");
    let dotted = raw.replace(['/', '.'], "-");
    let flattened = raw.replace(['/', '.', '_'], "-");

    let mut candidates = Vec::new();
    for variant in [base, dotted, flattened] {
        for candidate in [variant.clone(), variant.trim_start_matches('-').to_string()] {
            if !candidate.is_empty() && !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

fn newest_jsonl_in(dir: &Path) -> Option<(std::time::SystemTime, PathBuf)> {
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .flatten()
        .filter(|e| e.path().extension().is_some_and(|x| x == "jsonl"))
        .filter_map(|e| {
            let mtime = e.metadata().ok()?.modified().ok()?;
            Some((mtime, e.path()))
        })
        .max_by_key(|(mtime, _)| *mtime)
}

/// Recursive newest-`.jsonl` walk (codex nests sessions by date).
pub fn find_newest_jsonl(root: &Path) -> Option<PathBuf> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    walk_jsonl(root, &mut newest, 0);
    newest.map(|(_, path)| path)
}

fn walk_jsonl(dir: &Path, newest: &mut Option<(std::time::SystemTime, PathBuf)>, depth: u32) {
    if depth > 6 {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_jsonl(&path, newest, depth + 1);
        } else if path.extension().is_some_and(|x| x == "jsonl") {
            if let Ok(mtime) = entry.metadata().and_then(|m| m.modified()) {
                if newest.as_ref().is_none_or(|(t, _)| mtime > *t) {
                    *newest = Some((mtime, path));
                }
            }
        }
    }
}

/// Ask `lsof` about the shell pid and its children for an open codex
/// session log.
async fn lsof_codex_log(pane_pid: &str) -> Option<PathBuf> {
    let mut pids = vec![pane_pid.to_string()];

    let mut pgrep = Command::new("pgrep");
    pgrep.args(["-P", pane_pid]);
    if let Ok(output) = run_with_timeout(pgrep, LSOF_TIMEOUT, "pgrep").await {
        pids.extend(
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
        );
    }

    let mut lsof = Command::new("lsof");
    lsof.args(["-p", &pids.join(","), "-Fn"]);
    let output = run_with_timeout(lsof, LSOF_TIMEOUT, "lsof").await.ok()?;
    // -Fn output: one `n<path>` field per line.
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|l| l.strip_prefix('n'))
        .find(|path| is_codex_session_path(path))
        .map(PathBuf::from)
}

/// Matches `*.codex/sessions/*.jsonl` or `*/rollout-*.jsonl`.
pub fn is_codex_session_path(path: &str) -> bool {
    if !path.ends_with(".jsonl") {
        return false;
    }
    path.contains(".codex/sessions/")
        || Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("rollout-"))
}

#[cfg(test)]
#[path = "session_map_tests.rs"]
mod tests;
