// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Autogen fallback: synthesize a checkpoint from the session log
//!
//! When a role never answers a checkpoint request, the coordinator reads
//! the tail of that role's session log, renders it as a transcript, and
//! either asks the configured LLM summarizer for a summary or falls back
//! to a heuristic extraction. The result is written as a recovery bead
//! with reduced-confidence labels.

use super::AdminCoordinator;
use relay_adapters::{BeadSpec, BeadStore, BeadType, MuxAdapter, Summarizer};
use relay_core::{ChkId, Clock, EventKind, EventRecord, Role};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Fixed system prompt for the LLM summarizer.
const AUTOGEN_SYSTEM_PROMPT: &str = "You are summarizing an AI coding agent's working state \
from its session transcript. Respond in markdown with exactly these sections: \
## Current Goal / ## Key Decisions / ## Blockers / ## Next Steps. Be terse and concrete.";

/// Cap on items per heuristic section.
const HEURISTIC_SECTION_CAP: usize = 10;

/// One parsed transcript message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub ts: String,
    pub role: String,
    pub content: String,
}

impl<M, B, S, C> AdminCoordinator<M, B, S, C>
where
    M: MuxAdapter,
    B: BeadStore,
    S: Summarizer,
    C: Clock,
{
    /// Produce and store an autogen checkpoint for `role`.
    pub(super) async fn run_autogen(&self, role: Role, chk_id: ChkId) {
        let Some(log_path) = self.session_log(&role) else {
            tracing::warn!(role = %role, "autogen skipped: no session log discovered");
            self.inner.events.log_best_effort(
                EventRecord::new(EventKind::CheckpointAutogen)
                    .to_role(role)
                    .chk(chk_id)
                    .error("no session log discovered"),
            );
            return;
        };

        let budget =
            self.inner.config.autogen_input_tokens * self.inner.config.autogen_bytes_per_token;
        let tail = read_tail(&log_path, budget as u64);
        let transcript = render_transcript(&parse_log_messages(&tail));

        let (content, source, confidence) = match &self.inner.summarizer {
            Some(summarizer) => {
                match summarizer.summarize(AUTOGEN_SYSTEM_PROMPT, &transcript).await {
                    Ok(text) => (text, "autogen", "low"),
                    Err(e) => {
                        tracing::warn!(role = %role, error = %e, "summarizer failed, using heuristic");
                        (heuristic_summary(&transcript), "heuristic", "very-low")
                    }
                }
            }
            None => (heuristic_summary(&transcript), "heuristic", "very-low"),
        };

        let spec = BeadSpec {
            bead_type: BeadType::Recovery,
            title: format!("{role} autogen checkpoint"),
            labels: vec![
                ("role".into(), role.as_str().into()),
                ("chk_id".into(), chk_id.as_str().into()),
                ("source".into(), source.into()),
                ("confidence".into(), confidence.into()),
                ("writer".into(), super::WRITER_LABEL.into()),
            ],
            body: content,
        };

        match self.inner.beads.create(&spec).await {
            Ok(bead_id) => {
                let now = self.inner.clock.epoch_ms();
                {
                    let mut state = self.inner.state.lock();
                    state.last_checkpoint_time_ms.insert(role.clone(), now);
                    state.cooldown_until_ms.insert(
                        role.clone(),
                        now + self.inner.config.cooldown_after_checkpoint.as_millis() as u64,
                    );
                    state.metrics.autogen_runs += 1;
                    state.metrics.beads_written += 1;
                }
                self.inner.events.log_best_effort(
                    EventRecord::new(EventKind::CheckpointAutogen)
                        .to_role(role)
                        .chk(chk_id)
                        .status(format!("written:{bead_id}")),
                );
            }
            Err(e) => {
                self.inner.state.lock().metrics.bead_failures += 1;
                self.inner.events.log_best_effort(
                    EventRecord::new(EventKind::BeadWriteFailed)
                        .to_role(role)
                        .chk(chk_id)
                        .error(e.to_string()),
                );
            }
        }
    }
}

/// Read up to `budget` bytes from the end of `path`, dropping the first
/// partial line when the slice starts mid-file.
fn read_tail(path: &Path, budget: u64) -> String {
    let Ok(mut file) = std::fs::File::open(path) else {
        return String::new();
    };
    let len = file.metadata().map(|m| m.len()).unwrap_or(0);
    let start = len.saturating_sub(budget);
    if file.seek(SeekFrom::Start(start)).is_err() {
        return String::new();
    }
    let mut buf = Vec::with_capacity((len - start) as usize);
    if file.read_to_end(&mut buf).is_err() {
        return String::new();
    }
    let text = String::from_utf8_lossy(&buf);
    if start > 0 {
        match text.find('\n') {
            Some(idx) => text[idx + 1..].to_string(),
            None => String::new(),
        }
    } else {
        text.to_string()
    }
}

/// Parse claude-style session-log JSONL into transcript messages.
///
/// Lines that are not user/assistant records, or carry no text, are
/// skipped silently.
pub fn parse_log_messages(text: &str) -> Vec<LogMessage> {
    text.lines()
        .filter_map(|line| {
            let json: serde_json::Value = serde_json::from_str(line.trim()).ok()?;
            let role = json.get("type").and_then(|v| v.as_str())?;
            if role != "user" && role != "assistant" {
                return None;
            }
            let ts = json
                .get("timestamp")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let content = extract_content(json.get("message")?)?;
            Some(LogMessage {
                ts,
                role: role.to_string(),
                content,
            })
        })
        .collect()
}

fn extract_content(message: &serde_json::Value) -> Option<String> {
    let content = message.get("content")?;
    if let Some(text) = content.as_str() {
        return Some(text.to_string()).filter(|t| !t.trim().is_empty());
    }
    let blocks = content.as_array()?;
    let text = blocks
        .iter()
        .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    Some(text).filter(|t| !t.trim().is_empty())
}

/// Render messages as `[ts] role: content` lines.
pub fn render_transcript(messages: &[LogMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("[{}] {}: {}", m.ts, m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build a summary without any oracle: file references, function names,
/// error lines, and commands pulled straight from the transcript.
pub fn heuristic_summary(transcript: &str) -> String {
    let mut files = Vec::new();
    let mut functions = Vec::new();
    let mut errors = Vec::new();
    let mut commands = Vec::new();

    for line in transcript.lines() {
        let body = message_body(line);
        for token in body.split_whitespace() {
            // Parens stay on for function detection; paths get a full trim.
            let light = token.trim_matches(|c: char| "\"'`,;:".contains(c));
            let bare = light.trim_matches(|c: char| "()[]{}".contains(c));
            if looks_like_path(bare) {
                push_unique(&mut files, bare.to_string());
            } else if let Some(name) = function_name(light) {
                push_unique(&mut functions, format!("{name}()"));
            }
        }
        let lower = body.to_ascii_lowercase();
        if lower.contains("error") || lower.contains("panicked") {
            push_unique(&mut errors, body.trim().to_string());
        }
        if let Some(cmd) = command_line(body) {
            push_unique(&mut commands, cmd);
        }
    }

    let mut out = String::from("Auto-generated recovery summary (no agent response).\n");
    for (heading, items) in [
        ("## Recent Files", &files),
        ("## Functions", &functions),
        ("## Errors", &errors),
        ("## Commands", &commands),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push('\n');
        out.push_str(heading);
        out.push('\n');
        for item in items {
            out.push_str("- ");
            out.push_str(item);
            out.push('\n');
        }
    }

    if files.is_empty() && functions.is_empty() && errors.is_empty() && commands.is_empty() {
        out.push_str("\nNo signal extracted from the session tail.\n");
    }
    out
}

/// Strip the `[ts] role: ` transcript framing, if present.
fn message_body(line: &str) -> &str {
    let rest = line
        .strip_prefix('[')
        .and_then(|r| r.split_once("] "))
        .map(|(_, r)| r)
        .unwrap_or(line);
    rest.split_once(": ").map(|(_, content)| content).unwrap_or(rest)
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if list.len() < HEURISTIC_SECTION_CAP && !list.contains(&item) {
        list.push(item);
    }
}

/// A token with a slash and a file extension reads as a path.
fn looks_like_path(token: &str) -> bool {
    if !token.contains('/') || token.starts_with("http") {
        return false;
    }
    token
        .rsplit('/')
        .next()
        .is_some_and(|name| name.contains('.') && !name.ends_with('.'))
}

/// `ident(` reads as a function reference.
fn function_name(token: &str) -> Option<&str> {
    let open = token.find('(')?;
    let name = &token[..open];
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ':') {
        return None;
    }
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(name)
}

/// Lines that read as shell invocations.
fn command_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix("$ ") {
        return Some(rest.to_string());
    }
    const TOOLS: [&str; 6] = ["cargo ", "git ", "npm ", "make ", "go ", "python "];
    TOOLS
        .iter()
        .find(|t| trimmed.starts_with(*t))
        .map(|_| trimmed.to_string())
}

#[cfg(test)]
#[path = "autogen_tests.rs"]
mod tests;
