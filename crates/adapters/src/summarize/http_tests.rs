// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn extract_text_joins_blocks() {
    let value = serde_json::json!({
        "content": [
            {"type": "text", "text": "## Current Goal"},
            {"type": "tool_use", "name": "ignored"},
            {"type": "text", "text": "Ship the relay"},
        ]
    });
    assert_eq!(
        extract_text(&value).unwrap(),
        "## Current Goal\nShip the relay"
    );
}

#[test]
fn extract_text_rejects_empty_content() {
    let value = serde_json::json!({"content": []});
    assert!(matches!(
        extract_text(&value),
        Err(SummarizeError::BadResponse(_))
    ));

    let value = serde_json::json!({"error": {"message": "overloaded"}});
    assert!(matches!(
        extract_text(&value),
        Err(SummarizeError::BadResponse(_))
    ));
}

#[tokio::test]
async fn retries_exhaust_against_dead_endpoint() {
    let summarizer = HttpSummarizer::new(relay_core::LlmConfig {
        api_url: "http://127.0.0.1:1/v1/messages".into(),
        api_key: "test-key".into(),
        model: "test-model".into(),
        max_retries: 1,
    });
    let err = summarizer.summarize("system", "transcript").await;
    assert!(matches!(err, Err(SummarizeError::RetriesExhausted(_))));
}
