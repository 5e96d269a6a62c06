// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Envelope wire formats: JSONL and RMF v2, plus pane framing.
//!
//! Both surface formats are always parseable; a deployment uses one.
//! Parse errors never abort the inbox watcher — callers log and skip.

use crate::clock::Clock;
use crate::envelope::{Envelope, Kind, PRIORITY_LOW, PRIORITY_URGENT};
use crate::id::MsgId;
use crate::role::{Role, Target};
use serde::Deserialize;
use thiserror::Error;

/// Errors from envelope parsing.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("unknown kind: {0}")]
    UnknownKind(String),
    #[error("missing `---` delimiter")]
    MissingDelimiter,
}

/// Loosely-typed JSONL surface form. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    msg_id: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    priority: Option<i64>,
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    payload: Option<String>,
    #[serde(default)]
    ephemeral: Option<bool>,
}

/// Parse one JSONL line into an envelope.
///
/// Missing `msg_id` / `ts` / `priority` / `kind` take defaults; missing
/// `from` falls back to the inbox file name; missing `to` fails the line.
pub fn parse_jsonl_line<C: Clock>(
    line: &str,
    fallback_from: Option<&Role>,
    clock: &C,
) -> Result<Envelope, WireError> {
    let raw: RawEnvelope = serde_json::from_str(line)?;
    finish(raw, fallback_from, clock)
}

/// Parse an RMF v2 message: case-insensitive headers, a literal `---`
/// line, then the payload body.
pub fn parse_rmf<C: Clock>(
    text: &str,
    fallback_from: Option<&Role>,
    clock: &C,
) -> Result<Envelope, WireError> {
    let mut raw = RawEnvelope::default();
    let mut body: Option<String> = None;
    let mut lines = text.lines();

    for line in lines.by_ref() {
        if line.trim() == "---" {
            body = Some(lines.collect::<Vec<_>>().join("\n"));
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim().to_ascii_uppercase().as_str() {
            "TO" => raw.to = Some(value),
            "FROM" => raw.from = Some(value),
            "PROJECT" | "PROJECT_ID" => raw.project_id = Some(value),
            "KIND" => raw.kind = Some(value),
            "THREAD" | "THREAD_ID" => raw.thread_id = Some(value),
            "MSG_ID" => raw.msg_id = Some(value),
            "TS" => raw.ts = Some(value),
            "PRIORITY" => raw.priority = value.parse::<i64>().ok(),
            "EPHEMERAL" => {
                raw.ephemeral = Some(matches!(
                    value.to_ascii_lowercase().as_str(),
                    "true" | "1" | "yes"
                ));
            }
            _ => {}
        }
    }

    raw.payload = Some(body.ok_or(WireError::MissingDelimiter)?);
    finish(raw, fallback_from, clock)
}

/// Apply accept-time defaults and closed-sum discrimination.
fn finish<C: Clock>(
    raw: RawEnvelope,
    fallback_from: Option<&Role>,
    clock: &C,
) -> Result<Envelope, WireError> {
    let to = raw
        .to
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Target::parse)
        .ok_or(WireError::MissingField("to"))?;

    let from = match raw.from.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(f) => Role::normalized(f),
        None => fallback_from
            .cloned()
            .ok_or(WireError::MissingField("from"))?,
    };

    let kind = match raw.kind.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(k) => Kind::parse(k).ok_or_else(|| WireError::UnknownKind(k.to_string()))?,
        None => Kind::Chat,
    };

    Ok(Envelope {
        msg_id: raw
            .msg_id
            .filter(|s| !s.is_empty())
            .map(MsgId::new)
            .unwrap_or_else(MsgId::generate),
        ts: raw.ts.filter(|s| !s.is_empty()).unwrap_or_else(|| clock.rfc3339()),
        project_id: raw.project_id.filter(|s| !s.is_empty()),
        from,
        to,
        kind,
        priority: clamp_priority(raw.priority),
        thread_id: raw.thread_id.filter(|s| !s.is_empty()),
        payload: sanitize_text(raw.payload.as_deref().unwrap_or("")),
        ephemeral: raw.ephemeral.unwrap_or(false),
    })
}

fn clamp_priority(p: Option<i64>) -> u8 {
    match p {
        Some(p) => p.clamp(PRIORITY_URGENT as i64, PRIORITY_LOW as i64) as u8,
        None => crate::envelope::PRIORITY_NORMAL,
    }
}

/// Strip control characters that would break re-framing.
///
/// Keeps `\n` and `\t`; everything else in C0 plus DEL is dropped.
pub fn sanitize_text(s: &str) -> String {
    if !s.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
        return s.to_string();
    }
    s.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Escape the payload body for pane framing.
///
/// Only `&` and `<` are escaped; `>` passes through unchanged.
pub fn escape_payload(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;")
}

/// Wrap a payload for keystroke delivery to a pane.
pub fn wrap_relay_message(from: &Role, to: &Role, kind: Kind, payload: &str) -> String {
    format!(
        "<relay-message from=\"{from}\" to=\"{to}\" kind=\"{kind}\">\n\
         [Relay from {from}. Not from the human user.]\n\n\
         {body}\n\
         </relay-message>",
        body = escape_payload(payload),
    )
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
