// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router: the daemon boundary between the inbox and the panes
//!
//! Stamps relay activity, expands broadcasts into one clone per known
//! non-sender role, and hands checkpoint protocol envelopes to the admin
//! coordinator instead of a pane.

use crate::admin::AdminCoordinator;
use crate::injector::Injector;
use crate::lifecycle::Shutdown;
use relay_adapters::{BeadStore, MuxAdapter, Summarizer};
use relay_core::{Clock, Envelope, Kind, Role, Target};
use tokio::sync::mpsc;

/// Routing loop state.
pub struct Router<M: MuxAdapter, B: BeadStore, S: Summarizer, C: Clock> {
    injector: Injector<M, C>,
    admin: AdminCoordinator<M, B, S, C>,
    roles: Vec<Role>,
}

impl<M: MuxAdapter, B: BeadStore, S: Summarizer, C: Clock> Router<M, B, S, C> {
    pub fn new(
        injector: Injector<M, C>,
        admin: AdminCoordinator<M, B, S, C>,
        roles: Vec<Role>,
    ) -> Self {
        Self {
            injector,
            admin,
            roles,
        }
    }

    /// Drain envelopes until the channel closes or shutdown.
    pub async fn run(self, mut rx: mpsc::Receiver<Envelope>, mut shutdown: Shutdown) {
        loop {
            tokio::select! {
                envelope = rx.recv() => {
                    match envelope {
                        Some(envelope) => self.handle(envelope).await,
                        None => return,
                    }
                }
                _ = shutdown.cancelled() => return,
            }
        }
    }

    /// Route one envelope.
    pub async fn handle(&self, envelope: Envelope) {
        // Every accepted envelope counts as relay traffic for the
        // checkpoint idle gate.
        self.admin.note_relay_activity();

        match envelope.kind {
            Kind::CheckpointAck => {
                self.admin.handle_ack(&envelope);
            }
            Kind::CheckpointContent if is_to_admin(&envelope) => {
                self.admin.handle_content(&envelope).await;
            }
            _ => self.dispatch(envelope),
        }
    }

    fn dispatch(&self, envelope: Envelope) {
        match &envelope.to {
            Target::All => {
                // One independent clone per known non-sender role; a
                // failed enqueue for one role must not stop the others.
                for role in &self.roles {
                    if *role == envelope.from {
                        continue;
                    }
                    let clone = envelope.clone_for(role.clone());
                    if let Err(e) = self.injector.inject(clone) {
                        tracing::warn!(to = %role, error = %e, "broadcast clone rejected");
                    }
                }
            }
            Target::Role(_) => {
                if let Err(e) = self.injector.inject(envelope) {
                    tracing::warn!(error = %e, "inject rejected");
                }
            }
        }
    }
}

fn is_to_admin(envelope: &Envelope) -> bool {
    matches!(&envelope.to, Target::Role(r) if r.is_admin())
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
