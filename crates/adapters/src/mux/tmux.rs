// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux multiplexer adapter

use super::{MuxAdapter, MuxError};
use crate::subprocess::{run_with_timeout, MUX_TIMEOUT};
use async_trait::async_trait;
use relay_core::PaneId;
use tokio::process::Command;

/// Tmux-based multiplexer adapter
#[derive(Clone, Default)]
pub struct TmuxAdapter;

impl TmuxAdapter {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, args: &[&str], description: &str) -> Result<String, MuxError> {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        let output = run_with_timeout(cmd, MUX_TIMEOUT, description)
            .await
            .map_err(MuxError::CommandFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(MuxError::CommandFailed(format!(
                "{description}: {stderr}"
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl MuxAdapter for TmuxAdapter {
    async fn send_literal(&self, pane: &PaneId, text: &str) -> Result<(), MuxError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        self.run(
            &["send-keys", "-t", pane.as_str(), "-l", "--", text],
            "tmux send-keys -l",
        )
        .await
        .map(|_| ())
    }

    async fn send_key(&self, pane: &PaneId, key: &str) -> Result<(), MuxError> {
        self.run(
            &["send-keys", "-t", pane.as_str(), key],
            "tmux send-keys",
        )
        .await
        .map(|_| ())
    }

    async fn paste(&self, pane: &PaneId, buffer: &str, text: &str) -> Result<(), MuxError> {
        // Stage the payload in a named buffer via stdin, then paste it.
        // send-keys -l would also work but mangles multi-line payloads on
        // some terminals.
        let mut cmd = Command::new("tmux");
        cmd.args(["load-buffer", "-b", buffer, "-"]);
        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| MuxError::CommandFailed(format!("tmux load-buffer spawn: {e}")))?;
        if let Some(mut stdin) = child.stdin.take() {
            use tokio::io::AsyncWriteExt;
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| MuxError::CommandFailed(format!("tmux load-buffer write: {e}")))?;
        }
        let output = tokio::time::timeout(MUX_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| MuxError::CommandFailed("tmux load-buffer timed out".into()))?
            .map_err(|e| MuxError::CommandFailed(format!("tmux load-buffer: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(MuxError::CommandFailed(format!("tmux load-buffer: {stderr}")));
        }

        self.run(
            &["paste-buffer", "-d", "-b", buffer, "-t", pane.as_str()],
            "tmux paste-buffer",
        )
        .await
        .map(|_| ())
    }

    async fn capture_tail(&self, pane: &PaneId, lines: u32) -> Result<String, MuxError> {
        self.run(
            &[
                "capture-pane",
                "-t",
                pane.as_str(),
                "-p",
                "-S",
                &format!("-{lines}"),
            ],
            "tmux capture-pane",
        )
        .await
    }

    async fn display(&self, pane: &PaneId, format: &str) -> Result<String, MuxError> {
        self.run(
            &["display-message", "-t", pane.as_str(), "-p", format],
            "tmux display-message",
        )
        .await
        .map(|s| s.trim().to_string())
    }

    async fn resize_pulse(&self, pane: &PaneId) -> Result<(), MuxError> {
        // Shrink by one cell then restore; enough to raise SIGWINCH in the
        // pane's process group.
        self.run(
            &["resize-pane", "-t", pane.as_str(), "-D", "1"],
            "tmux resize-pane",
        )
        .await?;
        self.run(
            &["resize-pane", "-t", pane.as_str(), "-U", "1"],
            "tmux resize-pane",
        )
        .await
        .map(|_| ())
    }

    async fn list_panes(&self, session: &str) -> Result<Vec<PaneId>, MuxError> {
        let stdout = self
            .run(
                &["list-panes", "-s", "-t", session, "-F", "#{pane_id}"],
                "tmux list-panes",
            )
            .await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PaneId::new)
            .collect())
    }

    async fn attached_clients(&self, session: &str) -> Result<u32, MuxError> {
        let stdout = self
            .run(
                &[
                    "display-message",
                    "-t",
                    session,
                    "-p",
                    "#{session_attached}",
                ],
                "tmux display-message",
            )
            .await?;
        Ok(stdout.trim().parse::<u32>().unwrap_or(0))
    }
}
