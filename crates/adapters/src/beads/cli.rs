// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bd` CLI bead store adapter

use super::{BeadError, BeadListItem, BeadQuery, BeadSpec, BeadStore, BeadType};
use crate::subprocess::{combined_output, run_with_timeout, BEAD_TIMEOUT};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// Bead store backed by the external `bd` executable.
#[derive(Clone)]
pub struct BdCli {
    program: String,
    db: Option<PathBuf>,
}

impl Default for BdCli {
    fn default() -> Self {
        Self {
            program: "bd".into(),
            db: None,
        }
    }
}

impl BdCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Honor `RELAY_BEADS_DB`: when set and the file exists, `--db <path>`
    /// is prepended to every invocation.
    pub fn from_env() -> Self {
        let db = std::env::var("RELAY_BEADS_DB")
            .ok()
            .map(PathBuf::from)
            .filter(|p| p.exists());
        Self {
            program: "bd".into(),
            db,
        }
    }

    #[cfg(test)]
    fn with_db(db: PathBuf) -> Self {
        Self {
            program: "bd".into(),
            db: Some(db),
        }
    }

    fn base_args(&self) -> Vec<String> {
        match &self.db {
            Some(db) => vec!["--db".into(), db.display().to_string()],
            None => Vec::new(),
        }
    }

    async fn run(&self, args: Vec<String>, description: &str) -> Result<String, BeadError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.base_args());
        cmd.args(&args);

        let output = run_with_timeout(cmd, BEAD_TIMEOUT, description)
            .await
            .map_err(BeadError::CommandFailed)?;

        if !output.status.success() {
            return Err(BeadError::CommandFailed(format!(
                "{description}: {}",
                combined_output(&output)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Argument vector for `bd create`.
fn create_args(spec: &BeadSpec) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "create".into(),
        "--type".into(),
        spec.bead_type.as_str().into(),
        "--title".into(),
        spec.title.clone(),
    ];
    for (key, value) in &spec.labels {
        args.push("--label".into());
        args.push(format!("{key}:{value}"));
    }
    args.push("--body".into());
    args.push(spec.body.clone());
    args
}

/// Argument vector for `bd show`.
fn show_args(id: &str, raw_body: bool) -> Vec<String> {
    let mut args: Vec<String> = vec!["show".into(), id.into()];
    if raw_body {
        args.push("--body".into());
    }
    args
}

/// Argument vector for `bd list`.
fn list_args(bead_type: BeadType, query: &BeadQuery) -> Vec<String> {
    let mut args: Vec<String> = vec!["list".into(), "--type".into(), bead_type.as_str().into()];
    for (key, value) in &query.labels {
        args.push("--label".into());
        args.push(format!("{key}:{value}"));
    }
    args.push("--limit".into());
    args.push(query.limit.max(1).to_string());
    if let Some(status) = &query.status {
        args.push("--status".into());
        args.push(status.clone());
    }
    if let Some(after) = &query.created_after {
        args.push("--created-after".into());
        args.push(after.clone());
    }
    args.push("--json".into());
    args
}

#[async_trait]
impl BeadStore for BdCli {
    async fn create(&self, spec: &BeadSpec) -> Result<String, BeadError> {
        let stdout = self.run(create_args(spec), "bd create").await?;
        stdout
            .split_whitespace()
            .next()
            .map(String::from)
            .ok_or_else(|| BeadError::NoId(stdout))
    }

    async fn find_latest(
        &self,
        bead_type: BeadType,
        query: &BeadQuery,
    ) -> Result<Option<BeadListItem>, BeadError> {
        let stdout = self.run(list_args(bead_type, query), "bd list").await?;
        let items: serde_json::Value = serde_json::from_str(stdout.trim())
            .map_err(|e| BeadError::InvalidJson(e.to_string()))?;
        let Some(array) = items.as_array() else {
            return Err(BeadError::InvalidJson("expected a json array".into()));
        };

        // bd lists newest first; take the first parseable item.
        Ok(array.iter().find_map(BeadListItem::parse))
    }

    async fn show_body(&self, id: &str) -> Result<String, BeadError> {
        let body = self.run(show_args(id, true), "bd show --body").await?;
        if !body.trim().is_empty() {
            return Ok(body);
        }
        // Bodyless bead: the plain rendering still carries the fields.
        self.run(show_args(id, false), "bd show").await
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
