// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake bead store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{BeadError, BeadListItem, BeadQuery, BeadSpec, BeadStore, BeadType};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded bead store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeadCall {
    Create(BeadSpec),
    FindLatest { bead_type: String, query: BeadQuery },
    ShowBody { id: String },
}

struct FakeBeadState {
    calls: Vec<BeadCall>,
    next_id: u64,
    fail_creates: bool,
    latest: Option<BeadListItem>,
    bodies: std::collections::HashMap<String, String>,
}

/// Fake bead store for testing
#[derive(Clone)]
pub struct FakeBeadStore {
    inner: Arc<Mutex<FakeBeadState>>,
}

impl Default for FakeBeadStore {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeBeadState {
                calls: Vec::new(),
                next_id: 0,
                fail_creates: false,
                latest: None,
                bodies: std::collections::HashMap::new(),
            })),
        }
    }
}

impl FakeBeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<BeadCall> {
        self.inner.lock().calls.clone()
    }

    /// Specs of every `create` call, in order.
    pub fn created(&self) -> Vec<BeadSpec> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BeadCall::Create(spec) => Some(spec.clone()),
                _ => None,
            })
            .collect()
    }

    /// Make every create fail.
    pub fn set_fail_creates(&self, fail: bool) {
        self.inner.lock().fail_creates = fail;
    }

    /// Answer for `find_latest`.
    pub fn set_latest(&self, item: Option<BeadListItem>) {
        self.inner.lock().latest = item;
    }

    /// Answer for `show_body` of one id.
    pub fn set_body(&self, id: &str, body: &str) {
        self.inner.lock().bodies.insert(id.into(), body.into());
    }
}

#[async_trait]
impl BeadStore for FakeBeadStore {
    async fn create(&self, spec: &BeadSpec) -> Result<String, BeadError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BeadCall::Create(spec.clone()));
        if inner.fail_creates {
            return Err(BeadError::CommandFailed("fake create failure".into()));
        }
        inner.next_id += 1;
        Ok(format!("bd-{}", inner.next_id))
    }

    async fn find_latest(
        &self,
        bead_type: BeadType,
        query: &BeadQuery,
    ) -> Result<Option<BeadListItem>, BeadError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BeadCall::FindLatest {
            bead_type: bead_type.as_str().to_string(),
            query: query.clone(),
        });
        Ok(inner.latest.clone())
    }

    async fn show_body(&self, id: &str) -> Result<String, BeadError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BeadCall::ShowBody { id: id.to_string() });
        inner
            .bodies
            .get(id)
            .cloned()
            .ok_or_else(|| BeadError::CommandFailed(format!("unknown bead: {id}")))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
