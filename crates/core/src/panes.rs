// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane map: role → opaque pane id, with version and registration time

use crate::id::PaneId;
use crate::role::Role;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// Errors from pane-map parsing.
#[derive(Debug, Error)]
pub enum PaneMapError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pane map is neither a flat map nor a versioned object")]
    UnknownShape,
}

/// Process-wide mapping of roles to panes.
///
/// Stale when `registered_at` is missing, unparseable, or before the last
/// completed recycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaneMap {
    pub panes: IndexMap<Role, PaneId>,
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<String>,
}

impl PaneMap {
    /// Parse either the versioned form `{panes, version, registered_at}`
    /// or the legacy flat `{role: pane_id}` form.
    pub fn parse(text: &str) -> Result<Self, PaneMapError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        let obj = json.as_object().ok_or(PaneMapError::UnknownShape)?;

        if let Some(panes) = obj.get("panes").and_then(|v| v.as_object()) {
            return Ok(Self {
                panes: collect_panes(panes),
                version: obj.get("version").and_then(|v| v.as_u64()).unwrap_or(0),
                registered_at: obj
                    .get("registered_at")
                    .and_then(|v| v.as_str())
                    .map(String::from),
            });
        }

        // Legacy flat layout: every value must be a string pane id.
        if obj.values().all(|v| v.is_string()) {
            return Ok(Self {
                panes: collect_panes(obj),
                version: 0,
                registered_at: None,
            });
        }

        Err(PaneMapError::UnknownShape)
    }

    /// Hard-coded fallback used when the pane-map file is unreadable.
    pub fn fallback_default() -> Self {
        let mut panes = IndexMap::new();
        panes.insert(Role::new("oc"), PaneId::new("%0"));
        panes.insert(Role::new("cc"), PaneId::new("%1"));
        panes.insert(Role::new("cx"), PaneId::new("%2"));
        panes.insert(Role::new("admin"), PaneId::new("%3"));
        Self {
            panes,
            version: 0,
            registered_at: None,
        }
    }

    pub fn resolve(&self, role: &Role) -> Option<&PaneId> {
        self.panes.get(role)
    }

    /// Registration time, if present and parseable.
    pub fn registered_at_utc(&self) -> Option<DateTime<Utc>> {
        self.registered_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    /// Stale if never registered, unparseable, or registered before the
    /// last completed recycle.
    pub fn is_stale(&self, last_recycle: Option<DateTime<Utc>>) -> bool {
        match self.registered_at_utc() {
            None => true,
            Some(at) => match last_recycle {
                Some(recycled) => at < recycled,
                None => false,
            },
        }
    }
}

fn collect_panes(obj: &serde_json::Map<String, serde_json::Value>) -> IndexMap<Role, PaneId> {
    obj.iter()
        .filter_map(|(role, pane)| {
            pane.as_str()
                .map(|p| (Role::normalized(role), PaneId::new(p)))
        })
        .collect()
}

#[cfg(test)]
#[path = "panes_tests.rs"]
mod tests;
