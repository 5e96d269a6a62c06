// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned event-log records
//!
//! Every state-changing operation emits one record. Serialized as one
//! JSON line each; the event log file is the only total order the daemon
//! offers, and only for the events it actually records.

use crate::id::{ChkId, EventId, MsgId};
use crate::role::Role;
use serde::{Deserialize, Serialize};

/// Current record schema version.
pub const EVENT_SCHEMA_VERSION: u32 = 1;

/// Discriminator for event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // -- injector --
    Enqueue,
    Inject,
    Drop,
    Blocked,
    UnknownTarget,

    // -- inbox watcher --
    ParseError,
    InboxDrop,

    // -- admin / checkpoint --
    CheckpointRequest,
    CheckpointAck,
    CheckpointAckIgnored,
    CheckpointContentNoPending,
    CheckpointContentStale,
    CheckpointContentWrongSender,
    Timeout,
    CheckpointAutogen,
    BeadWriteFailed,

    // -- admin timer / recycler --
    AdminCommandRejected,
    AdminDeadman,
    CheckpointSkippedIdle,
    AdminRecycleComplete,
    PaneMapReloaded,
}

/// One event-log record.
///
/// `v`, `ts_ms`, and `event_id` are auto-filled at log time if unset.
/// Only `ts_ms` is emitted; the legacy RFC-3339 `ts` field is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chk_id: Option<ChkId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<MsgId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl EventRecord {
    pub fn new(kind: EventKind) -> Self {
        Self {
            v: None,
            ts_ms: None,
            event_id: None,
            kind,
            from: None,
            to: None,
            chk_id: None,
            status: None,
            msg_id: None,
            error: None,
            latency_ms: None,
            count: None,
        }
    }

    pub fn from_role(mut self, from: impl Into<Role>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn to_role(mut self, to: impl Into<Role>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn chk(mut self, chk_id: impl Into<ChkId>) -> Self {
        self.chk_id = Some(chk_id.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn msg(mut self, msg_id: impl Into<MsgId>) -> Self {
        self.msg_id = Some(msg_id.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn latency_ms(mut self, ms: u64) -> Self {
        self.latency_ms = Some(ms);
        self
    }

    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
