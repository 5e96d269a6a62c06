// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod Relay Daemon (relayd)
//!
//! Supervisor process for a multi-agent coding pod: routes structured
//! messages between agents living in terminal-multiplexer panes, drives
//! the checkpoint protocol, and recycles the admin pane.
//!
//! Architecture:
//! - Inbox watcher: turns appended inbox bytes into envelopes
//! - Router: broadcast expansion and admin dispatch at the daemon boundary
//! - Injector: one FIFO queue and worker per role pane
//! - Admin coordinator: checkpoint request/ack/content/autogen protocol
//! - Recycler + admin timer: health checks, cycle counting, pane recycle
//! - Lifecycle: lockfile, signals, panic guards, tombstone

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod admin;
pub mod env;
pub mod idle;
pub mod inbox;
pub mod injector;
pub mod lifecycle;
pub mod pane_tail;
pub mod recycler;
pub mod router;
pub mod session_map;

pub use lifecycle::{
    spawn_guarded, Fatal, LifecycleError, Paths, Shutdown, ShutdownHandle,
};

#[cfg(test)]
mod test_support;
