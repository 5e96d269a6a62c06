// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-adapters: capability objects for the pod relay daemon
//!
//! Every external program the daemon drives (the terminal multiplexer,
//! the bead store CLI, the LLM summarizer, the filesystem notification
//! backend) is reached through a trait constructed at startup; tests
//! substitute in-process fakes that record invocation vectors.

pub mod beads;
pub mod env;
pub mod fswatch;
pub mod mux;
pub mod subprocess;
pub mod summarize;

pub use beads::{BeadError, BeadListItem, BeadQuery, BeadSpec, BeadStore, BeadType, BdCli};
pub use fswatch::{DirWatcher, FsEvent, FsEventKind, FsWatchError};
pub use mux::{MuxAdapter, MuxError, PaneSender, SendOptions, TmuxAdapter};
pub use summarize::{HttpSummarizer, SummarizeError, Summarizer};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use beads::{BeadCall, FakeBeadStore};
#[cfg(any(test, feature = "test-support"))]
pub use mux::{FakeMuxAdapter, MuxCall};
#[cfg(any(test, feature = "test-support"))]
pub use summarize::FakeSummarizer;
