// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

// Structured event helpers. Call sites stay single-line; levels and field
// names are decided here.

use tracing::{debug, trace, warn};

use crate::error::SchemaError;
use crate::ident::{Lid, ResourceKey};

/// An edge's effective state changed and its owner was notified.
pub(crate) fn edge_notified(key: &ResourceKey, field: &str) {
    trace!(ty = key.ty(), lid = %key.lid(), field, "edge notified");
}

/// A settle flushed its queued notifications.
pub(crate) fn settle_flushed(count: usize) {
    if count > 0 {
        debug!(count, "settle flushed");
    }
}

/// A subtype was accepted for a polymorphic field and remembered.
pub(crate) fn polymorphic_registered(base: &str, subtype: &str) {
    debug!(base, subtype, "polymorphic subtype registered");
}

/// An incoming member list repeated lids; the repeats were dropped.
pub(crate) fn duplicate_members_dropped(owner: &ResourceKey, field: &str, dropped: &[Lid]) {
    warn!(
        ty = owner.ty(),
        lid = %owner.lid(),
        field,
        dropped = ?dropped,
        "incoming membership repeated members; keeping first occurrences"
    );
}

/// A provisional identity absorbed a persisted one.
pub(crate) fn identity_merged(kept: &ResourceKey, abandoned: &ResourceKey) {
    debug!(ty = kept.ty(), kept = %kept.lid(), abandoned = %abandoned.lid(), "identity merged");
}

/// A resource's edges were torn down.
pub(crate) fn resource_unloaded(key: &ResourceKey, edges: usize) {
    debug!(ty = key.ty(), lid = %key.lid(), edges, "resource unloaded");
}

/// A mutation was refused because of a schema problem.
pub(crate) fn schema_rejected(error: &SchemaError) {
    warn!(%error, "schema rejected mutation");
}
