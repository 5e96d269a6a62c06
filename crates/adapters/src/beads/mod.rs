// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bead store adapters
//!
//! The daemon creates typed, labeled, markdown-bodied records through the
//! external `bd` CLI, and queries the most recent record matching a label
//! set. The store's internal structure is out of scope.

mod cli;

pub use cli::BdCli;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BeadCall, FakeBeadStore};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from bead store operations
#[derive(Debug, Error)]
pub enum BeadError {
    #[error("bd invocation failed: {0}")]
    CommandFailed(String),
    #[error("bd returned no bead id: {0}")]
    NoId(String),
    #[error("bd returned invalid json: {0}")]
    InvalidJson(String),
}

/// Record type accepted by `bd create --type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeadType {
    Recovery,
    ChunkSummary,
    StateRollup,
}

impl BeadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BeadType::Recovery => "recovery",
            BeadType::ChunkSummary => "chunk_summary",
            BeadType::StateRollup => "state_rollup",
        }
    }
}

impl std::fmt::Display for BeadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One record to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeadSpec {
    pub bead_type: BeadType,
    pub title: String,
    /// `K:V` label pairs, in emission order.
    pub labels: Vec<(String, String)>,
    pub body: String,
}

/// Query for the most recent record matching a label set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeadQuery {
    pub labels: Vec<(String, String)>,
    pub status: Option<String>,
    pub created_after: Option<String>,
    pub limit: u32,
}

/// One duck-typed item from `bd list --json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeadListItem {
    pub id: String,
    pub status: Option<String>,
    pub created_at: Option<String>,
    /// Labels as `"K:V"` strings, as the CLI reports them.
    pub labels: Vec<String>,
}

impl BeadListItem {
    /// Parse one list item, accepting any of the id field spellings the
    /// CLI has used (`id`, `bead_id`, `checkpoint_id`, `chk_id`).
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        let id = ["id", "bead_id", "checkpoint_id", "chk_id"]
            .iter()
            .find_map(|k| value.get(*k).and_then(|v| v.as_str()))
            .filter(|s| !s.is_empty())?
            .to_string();

        let labels = value
            .get("labels")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|l| l.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            id,
            status: value
                .get("status")
                .and_then(|v| v.as_str())
                .map(String::from),
            created_at: value
                .get("created_at")
                .and_then(|v| v.as_str())
                .map(String::from),
            labels,
        })
    }

    /// True when the item carries the `K:V` label.
    pub fn has_label(&self, key: &str, value: &str) -> bool {
        let want = format!("{key}:{value}");
        self.labels.iter().any(|l| l == &want)
    }
}

/// Adapter for the external bead store.
#[async_trait]
pub trait BeadStore: Clone + Send + Sync + 'static {
    /// Create a record; returns the new bead id.
    async fn create(&self, spec: &BeadSpec) -> Result<String, BeadError>;

    /// Most recent record of `bead_type` matching the query, if any.
    async fn find_latest(
        &self,
        bead_type: BeadType,
        query: &BeadQuery,
    ) -> Result<Option<BeadListItem>, BeadError>;

    /// Body of one record. The raw body is preferred; stores may fall
    /// back to a human-formatted rendering when the raw body is empty.
    async fn show_body(&self, id: &str) -> Result<String, BeadError>;
}
