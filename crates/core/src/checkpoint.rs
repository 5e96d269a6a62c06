// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint-content payload parsing

use crate::id::ChkId;
use crate::role::Role;
use std::collections::BTreeMap;
use thiserror::Error;

/// Label keys the coordinator owns; colliding content labels are dropped.
pub const RESERVED_LABEL_KEYS: [&str; 5] = ["role", "chk_id", "source", "confidence", "writer"];

/// Errors from checkpoint-content parsing.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Parsed body of a `checkpoint_content` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPayload {
    pub chk_id: ChkId,
    pub role: Role,
    pub content: String,
    /// Extra labels the content carried, already filtered of reserved keys.
    pub labels: BTreeMap<String, String>,
    pub title: Option<String>,
}

impl ContentPayload {
    /// Parse the JSON body. All three required fields must be non-empty.
    pub fn parse(payload: &str) -> Result<Self, CheckpointError> {
        let json: serde_json::Value = serde_json::from_str(payload)?;

        let chk_id = required_str(&json, "chk_id")?;
        let role = required_str(&json, "role")?;
        let content = required_str(&json, "content")?;

        let labels = json
            .get("labels")
            .and_then(|v| v.as_object())
            .map(|map| {
                map.iter()
                    .filter(|(k, _)| !RESERVED_LABEL_KEYS.contains(&k.as_str()))
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let title = json
            .get("title")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from);

        Ok(Self {
            chk_id: ChkId::new(chk_id),
            role: Role::normalized(&role),
            content,
            labels,
            title,
        })
    }
}

fn required_str(json: &serde_json::Value, field: &'static str) -> Result<String, CheckpointError> {
    json.get(field)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or(CheckpointError::MissingField(field))
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
