// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the LLM summarizer endpoint

use super::{SummarizeError, Summarizer};
use async_trait::async_trait;
use relay_core::LlmConfig;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_SUMMARY_TOKENS: u32 = 1024;

/// Messages-API summarizer client with bounded retry.
#[derive(Clone)]
pub struct HttpSummarizer {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpSummarizer {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    async fn request_once(
        &self,
        system_prompt: &str,
        transcript: &str,
    ) -> Result<String, SummarizeError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": MAX_SUMMARY_TOKENS,
            "system": system_prompt,
            "messages": [{"role": "user", "content": transcript}],
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| SummarizeError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| SummarizeError::Request(e.to_string()))?;

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SummarizeError::BadResponse(e.to_string()))?;

        extract_text(&value)
    }
}

/// Pull the concatenated text blocks out of a messages-API response.
fn extract_text(value: &serde_json::Value) -> Result<String, SummarizeError> {
    let text: String = value
        .get("content")
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(SummarizeError::BadResponse("empty content".into()));
    }
    Ok(text)
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(
        &self,
        system_prompt: &str,
        transcript: &str,
    ) -> Result<String, SummarizeError> {
        let mut backoff = crate::env::llm_backoff_base_ms();
        let mut last_err = String::new();

        for attempt in 0..=self.config.max_retries {
            match self.request_once(system_prompt, transcript).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "summarizer request failed");
                    last_err = e.to_string();
                }
            }
            if attempt < self.config.max_retries {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(Duration::from_secs(30));
            }
        }

        Err(SummarizeError::RetriesExhausted(last_err))
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
