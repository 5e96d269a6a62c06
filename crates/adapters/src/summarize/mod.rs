// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LLM summarizer adapters
//!
//! Used only as a fallback summarization oracle from the autogen path.
//! Failures here are never fatal; the caller degrades to a heuristic
//! summary.

mod http;

pub use http::HttpSummarizer;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSummarizer;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from summarizer calls
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarizer request failed: {0}")]
    Request(String),
    #[error("summarizer returned an unusable response: {0}")]
    BadResponse(String),
    #[error("summarizer retries exhausted: {0}")]
    RetriesExhausted(String),
}

/// Adapter for the external summarization oracle.
#[async_trait]
pub trait Summarizer: Clone + Send + Sync + 'static {
    /// Produce a summary of `transcript` under `system_prompt`.
    async fn summarize(&self, system_prompt: &str, transcript: &str)
        -> Result<String, SummarizeError>;
}
