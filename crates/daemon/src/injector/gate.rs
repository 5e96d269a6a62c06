// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt-readiness gate
//!
//! A pane is ready for keystrokes when its agent is sitting at an input
//! prompt. The admin pane runs a chat agent rather than a shell and is
//! always considered ready.

use relay_adapters::MuxAdapter;
use relay_core::{PaneId, PromptGating, Role};

/// Glyphs a ready prompt line may begin with.
pub const PROMPT_GLYPHS: [char; 7] = ['❯', '›', '⏵', '?', '$', '%', '>'];

/// Lines captured for the readiness check.
const GATE_CAPTURE_LINES: u32 = 5;

/// Outcome of a readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Ready,
    /// Not ready; carries the pane tail for the `blocked` event.
    NotReady { tail: String },
}

/// Decide whether `pane` (running `role`) may receive a message now.
pub async fn pane_ready<M: MuxAdapter>(
    mux: &M,
    pane: &PaneId,
    role: &Role,
    gating: PromptGating,
) -> GateDecision {
    if role.is_admin() {
        return GateDecision::Ready;
    }
    match gating {
        PromptGating::None => return GateDecision::Ready,
        PromptGating::Oc if role.as_str() != "oc" => return GateDecision::Ready,
        _ => {}
    }

    // Copy mode swallows keystrokes silently.
    if let Ok(mode) = mux.display(pane, "#{pane_mode}").await {
        if mode.to_ascii_lowercase().contains("copy") {
            return GateDecision::NotReady { tail: mode };
        }
    }

    let tail = match mux.capture_tail(pane, GATE_CAPTURE_LINES).await {
        Ok(tail) => tail,
        Err(e) => {
            return GateDecision::NotReady {
                tail: format!("capture failed: {e}"),
            }
        }
    };

    if prompt_line_ready(&tail) {
        GateDecision::Ready
    } else {
        GateDecision::NotReady { tail }
    }
}

/// True when the last non-empty trimmed line begins with a prompt glyph.
pub fn prompt_line_ready(tail: &str) -> bool {
    tail.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .next_back()
        .and_then(|line| line.chars().next())
        .is_some_and(|c| PROMPT_GLYPHS.contains(&c))
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
