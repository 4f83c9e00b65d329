// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph behavior knobs.
use serde::{Deserialize, Serialize};

/// What to do when an incoming member list names the same resource twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first occurrence and log a warning.
    #[default]
    Dedupe,
    /// Fail the operation with
    /// [`ContractViolation::DuplicateIncoming`](crate::ContractViolation::DuplicateIncoming).
    Reject,
}

/// Runtime configuration for a [`crate::Graph`].
///
/// Serialized as JSON by `relcache-config`; every field falls back to its
/// default when missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Legacy behavior: a remote replace of a to-many relationship discards
    /// the edge's pending local changes.
    pub clear_local_on_remote_update: bool,
    /// Handling of repeated members in incoming lists.
    pub duplicate_members: DuplicatePolicy,
    /// Notify the owning edge on `initial` pushes as well.
    pub notify_initial_push: bool,
}
