// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent role tags and message targets

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Agent role tag (`oc`, `cc`, `cx`, `vog`, `admin`).
    pub struct Role;
}

/// The control role driving the admin pane.
pub const ADMIN: &str = "admin";

/// The broadcast target literal.
pub const ALL: &str = "all";

impl Role {
    /// Build a role from a file or directory name, lower-cased.
    pub fn normalized(s: &str) -> Self {
        Self(s.trim().to_ascii_lowercase())
    }

    pub fn is_admin(&self) -> bool {
        self.0 == ADMIN
    }
}

/// Recipient of an envelope: a single role or everyone but the sender.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Role(Role),
    All,
}

impl Target {
    pub fn parse(s: &str) -> Self {
        let t = s.trim().to_ascii_lowercase();
        if t == ALL {
            Target::All
        } else {
            Target::Role(Role::new(t))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Target::Role(r) => r.as_str(),
            Target::All => ALL,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Target::Role(r) if r.is_empty())
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Target {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Target::parse(&s))
    }
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod tests;
