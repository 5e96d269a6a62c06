// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The routed message record shared by every component

use crate::id::MsgId;
use crate::role::{Role, Target};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message kind. The set is closed; unknown kinds are parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Chat,
    Command,
    Event,
    Ack,
    Nag,
    CheckpointRequest,
    CheckpointContent,
    CheckpointAck,
}

impl Kind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Some(Kind::Chat),
            "command" => Some(Kind::Command),
            "event" => Some(Kind::Event),
            "ack" => Some(Kind::Ack),
            "nag" => Some(Kind::Nag),
            "checkpoint_request" => Some(Kind::CheckpointRequest),
            "checkpoint_content" => Some(Kind::CheckpointContent),
            "checkpoint_ack" => Some(Kind::CheckpointAck),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Chat => "chat",
            Kind::Command => "command",
            Kind::Event => "event",
            Kind::Ack => "ack",
            Kind::Nag => "nag",
            Kind::CheckpointRequest => "checkpoint_request",
            Kind::CheckpointContent => "checkpoint_content",
            Kind::CheckpointAck => "checkpoint_ack",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Urgent / normal / low. Accepted and logged, never reorders a queue.
pub const PRIORITY_URGENT: u8 = 0;
pub const PRIORITY_NORMAL: u8 = 1;
pub const PRIORITY_LOW: u8 = 2;

/// One routed message.
///
/// Immutable after acceptance: the inbox watcher creates envelopes from
/// bytes; the injector or admin handler consumes each exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub msg_id: MsgId,
    /// RFC-3339 UTC; populated at accept time if the wire form omitted it.
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub from: Role,
    pub to: Target,
    pub kind: Kind,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub payload: String,
    #[serde(default)]
    pub ephemeral: bool,
}

fn default_priority() -> u8 {
    PRIORITY_NORMAL
}

/// Validation failures surfaced by [`Envelope::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("envelope missing field: {0}")]
    Missing(&'static str),
}

impl Envelope {
    /// Check the fields every consumer relies on: `from`, `to`, `kind`
    /// (non-empty by construction), and `msg_id`.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.from.is_empty() {
            return Err(EnvelopeError::Missing("from"));
        }
        if self.to.is_empty() {
            return Err(EnvelopeError::Missing("to"));
        }
        if self.msg_id.is_empty() {
            return Err(EnvelopeError::Missing("msg_id"));
        }
        Ok(())
    }

    /// True when the payload is a bare slash command (`/health-check`).
    ///
    /// Slash commands bypass the readiness gate and are sent unwrapped.
    pub fn is_slash_command(&self) -> bool {
        self.payload.trim_start().starts_with('/')
    }

    /// Clone this envelope re-addressed to a single role, for broadcast
    /// expansion at the daemon boundary.
    pub fn clone_for(&self, to: Role) -> Self {
        let mut env = self.clone();
        env.msg_id = MsgId::generate();
        env.to = Target::Role(to);
        env
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
