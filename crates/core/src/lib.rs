// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-core: Core library for the pod relay daemon

pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod envelope;
pub mod event;
pub mod id;
pub mod panes;
pub mod role;
pub mod wire;

pub use checkpoint::{CheckpointError, ContentPayload, RESERVED_LABEL_KEYS};
pub use clock::{rfc3339_from_epoch_ms, Clock, FakeClock, SystemClock};
pub use config::{ConfigError, LlmConfig, PaneTailConfig, PromptGating, RelayConfig};
pub use envelope::{Envelope, EnvelopeError, Kind, PRIORITY_LOW, PRIORITY_NORMAL, PRIORITY_URGENT};
pub use event::{EventKind, EventRecord, EVENT_SCHEMA_VERSION};
pub use id::{ChkId, EventId, HexIdGen, IdGen, MsgId, PaneId, SequentialIdGen, ShortId};
pub use panes::{PaneMap, PaneMapError};
pub use role::{Role, Target, ADMIN, ALL};
pub use wire::{escape_payload, parse_jsonl_line, parse_rmf, sanitize_text, wrap_relay_message, WireError};
