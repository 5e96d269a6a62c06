// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake summarizer for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SummarizeError, Summarizer};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

struct FakeSummarizerState {
    calls: Vec<(String, String)>,
    response: Result<String, String>,
}

/// Fake summarizer for testing
#[derive(Clone)]
pub struct FakeSummarizer {
    inner: Arc<Mutex<FakeSummarizerState>>,
}

impl Default for FakeSummarizer {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeSummarizerState {
                calls: Vec::new(),
                response: Ok("## Current Goal\nfake summary".into()),
            })),
        }
    }
}

impl FakeSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded `(system_prompt, transcript)` pairs.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.inner.lock().calls.clone()
    }

    pub fn set_response(&self, text: &str) {
        self.inner.lock().response = Ok(text.to_string());
    }

    pub fn set_error(&self, error: &str) {
        self.inner.lock().response = Err(error.to_string());
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(
        &self,
        system_prompt: &str,
        transcript: &str,
    ) -> Result<String, SummarizeError> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push((system_prompt.to_string(), transcript.to_string()));
        match &inner.response {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(SummarizeError::RetriesExhausted(e.clone())),
        }
    }
}
