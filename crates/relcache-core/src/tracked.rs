// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Remote membership with a local pending overlay.
//!
//! The effective view is the remote order with pending removals spliced out
//! and pending additions appended. Remote and local changes stay separately
//! queryable so that a rollback and a "confirmed by the server" query are both
//! answerable.
//!
//! Overlay invariants:
//! - `removals` is a subset of `remote`.
//! - `additions` is disjoint from `remote`.
//! - `additions` and `removals` are disjoint.
use std::cell::OnceCell;

use crate::error::{ContractViolation, GraphError, IntegrityViolation};
use crate::ident::ResourceKey;
use crate::integrity;
use crate::membership::{MembershipDiff, MembershipSet};

/// Read-only snapshot of a tracked membership, for diff displays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipChanges {
    /// Remote (server-confirmed) members in order.
    pub canonical: Vec<ResourceKey>,
    /// Pending local additions in insertion order.
    pub additions: Vec<ResourceKey>,
    /// Pending local removals in removal order.
    pub removals: Vec<ResourceKey>,
}

/// Outcome of a remote state push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteUpdate {
    /// Change in remote membership; drives inverse propagation.
    pub remote: MembershipDiff,
    /// Change in the effective view; drives notification.
    pub effective: MembershipDiff,
}

/// Which layers an identity relabel touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Relabeled {
    pub(crate) remote: bool,
    pub(crate) overlay: bool,
}

/// Membership split into remote state and a pending local overlay.
#[derive(Debug, Clone, Default)]
pub struct TrackedMembership {
    remote: MembershipSet,
    additions: MembershipSet,
    removals: MembershipSet,
    effective: OnceCell<Vec<ResourceKey>>,
}

impl TrackedMembership {
    /// Creates an empty membership.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn invalidate(&mut self) {
        self.effective.take();
    }

    /// Replaces the remote membership and reconciles the overlay against it.
    ///
    /// A remote addition that was pending locally discharges the pending
    /// addition; a remote removal that was pending locally discharges the
    /// pending removal. Neither counts as an effective change. A remote
    /// reorder reorders the effective view as well.
    pub fn push_state(&mut self, next: Vec<ResourceKey>) -> Result<RemoteUpdate, GraphError> {
        let remote = self.remote.push_state(next)?;
        let mut effective = MembershipDiff {
            reordered: remote.reordered,
            ..MembershipDiff::default()
        };
        for key in &remote.additions {
            if !self.additions.remove(key) {
                effective.additions.push(key.clone());
            }
        }
        for key in &remote.removals {
            if !self.removals.remove(key) {
                effective.removals.push(key.clone());
            }
        }
        self.invalidate();
        Ok(RemoteUpdate { remote, effective })
    }

    /// Adds a single remote member. Returns `true` if the effective view
    /// gained it.
    pub fn add_remote(&mut self, key: ResourceKey) -> bool {
        if self.remote.has(&key) {
            return false;
        }
        let was_pending = self.additions.remove(&key);
        self.remote.add(key);
        self.invalidate();
        !was_pending
    }

    /// Removes a single remote member. Returns `true` if the effective view
    /// lost it.
    pub fn remove_remote(&mut self, key: &ResourceKey) -> bool {
        if !self.remote.remove(key) {
            return false;
        }
        let was_pending = self.removals.remove(key);
        self.invalidate();
        !was_pending
    }

    /// Local addition.
    ///
    /// Re-adding a pending removal discharges that removal.
    ///
    /// # Errors
    /// With checks enabled, adding a value that is already an effective member
    /// is [`ContractViolation::AlreadyMember`]; otherwise it is a no-op.
    pub fn add(&mut self, key: ResourceKey) -> Result<(), GraphError> {
        if self.removals.remove(&key) {
            self.invalidate();
            return Ok(());
        }
        if self.additions.has(&key) || self.remote.has(&key) {
            return integrity::ensure(|| false, || ContractViolation::AlreadyMember(key.lid().clone()));
        }
        self.additions.add(key);
        self.invalidate();
        Ok(())
    }

    /// Local removal.
    ///
    /// Removing a pending addition discharges that addition.
    ///
    /// # Errors
    /// With checks enabled, removing a value that is not an effective member is
    /// [`ContractViolation::NotAMember`]; otherwise it is a no-op.
    pub fn remove(&mut self, key: &ResourceKey) -> Result<(), GraphError> {
        if self.additions.remove(key) {
            self.invalidate();
            return Ok(());
        }
        if !self.remote.has(key) || self.removals.has(key) {
            return integrity::ensure(|| false, || ContractViolation::NotAMember(key.lid().clone()));
        }
        self.removals.add(key.clone());
        self.invalidate();
        Ok(())
    }

    /// Effective membership test.
    #[must_use]
    pub fn has(&self, key: &ResourceKey) -> bool {
        debug_assert!(
            !(self.additions.has(key) && self.removals.has(key)),
            "{key:?} is pending both addition and removal"
        );
        if self.remote.has(key) {
            !self.removals.has(key)
        } else {
            self.additions.has(key)
        }
    }

    /// `true` if `key` appears in the remote state or either overlay.
    #[must_use]
    pub fn references(&self, key: &ResourceKey) -> bool {
        self.remote.has(key) || self.additions.has(key) || self.removals.has(key)
    }

    /// `true` if `key` is a remote (server-confirmed) member.
    #[must_use]
    pub fn has_remote(&self, key: &ResourceKey) -> bool {
        self.remote.has(key)
    }

    /// Effective view, recomputed only after a mutation.
    pub fn data(&self) -> &[ResourceKey] {
        self.effective.get_or_init(|| {
            if self.additions.is_empty() && self.removals.is_empty() {
                return self.remote.to_vec();
            }
            let mut data: Vec<ResourceKey> = self
                .remote
                .iter()
                .filter(|k| !self.removals.has(k))
                .cloned()
                .collect();
            data.extend(self.additions.iter().cloned());
            data
        })
    }

    /// Remote members in order.
    #[must_use]
    pub fn canonical(&self) -> Vec<ResourceKey> {
        self.remote.to_vec()
    }

    /// `true` when the server reports no members.
    #[must_use]
    pub fn canonical_is_empty(&self) -> bool {
        self.remote.is_empty()
    }

    /// Pending additions in order.
    #[must_use]
    pub fn pending_additions(&self) -> Vec<ResourceKey> {
        self.additions.to_vec()
    }

    /// Pending removals in order.
    #[must_use]
    pub fn pending_removals(&self) -> Vec<ResourceKey> {
        self.removals.to_vec()
    }

    /// Snapshot of remote state and overlay.
    #[must_use]
    pub fn changes(&self) -> MembershipChanges {
        MembershipChanges {
            canonical: self.remote.to_vec(),
            additions: self.additions.to_vec(),
            removals: self.removals.to_vec(),
        }
    }

    /// `true` when the overlay is non-empty.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.additions.is_empty() || !self.removals.is_empty()
    }

    /// Discards the overlay. The returned diff is the effective change:
    /// restored removals are additions, dropped additions are removals.
    pub fn rollback(&mut self) -> MembershipDiff {
        let diff = MembershipDiff {
            additions: self.removals.take(),
            removals: self.additions.take(),
            ..MembershipDiff::default()
        };
        if !diff.is_empty() {
            self.invalidate();
        }
        diff
    }

    /// Re-sequences pending additions to follow their order in `wanted`.
    /// Returns `true` if the effective order changed.
    pub(crate) fn reorder_additions(&mut self, wanted: &[ResourceKey]) -> bool {
        if self.additions.len() < 2 {
            return false;
        }
        let previous = std::mem::take(&mut self.additions);
        for key in wanted {
            if previous.has(key) {
                self.additions.add(key.clone());
            }
        }
        // Keep anything `wanted` did not mention rather than dropping it.
        for key in previous.iter() {
            self.additions.add(key.clone());
        }
        let reordered = self.additions.iter().ne(previous.iter());
        if reordered {
            self.invalidate();
        }
        reordered
    }

    /// Drops `key` from every layer. Returns `true` if it was an effective
    /// member.
    pub fn remove_completely(&mut self, key: &ResourceKey) -> bool {
        let was_member = self.has(key);
        let touched = self.remote.remove(key) | self.additions.remove(key) | self.removals.remove(key);
        if touched {
            self.invalidate();
        }
        was_member
    }

    /// Empties every layer and returns all keys that were remote members or
    /// pending additions.
    pub fn clear(&mut self) -> Vec<ResourceKey> {
        let mut all = self.remote.take();
        all.extend(self.additions.take());
        self.removals.take();
        self.invalidate();
        all
    }

    /// Swaps `old` for `new` in every layer, preserving positions.
    pub(crate) fn relabel(&mut self, old: &ResourceKey, new: &ResourceKey) -> Relabeled {
        let remote = self.remote.relabel(old, new);
        let overlay = self.additions.relabel(old, new) | self.removals.relabel(old, new);
        // Both identities may have been present in different layers.
        if self.remote.has(new) {
            self.additions.remove(new);
        } else {
            self.removals.remove(new);
        }
        if remote || overlay {
            self.invalidate();
        }
        Relabeled { remote, overlay }
    }

    /// Re-verifies the overlay invariants and the effective view.
    pub fn verify(&self) -> Result<(), GraphError> {
        if !integrity::checks_enabled() {
            return Ok(());
        }
        for key in self.additions.iter() {
            integrity::ensure(
                || !self.removals.has(key),
                || IntegrityViolation::OverlayOverlap(key.lid().clone()),
            )?;
            integrity::ensure(
                || !self.remote.has(key),
                || IntegrityViolation::DuplicateMember(key.lid().clone()),
            )?;
        }
        for key in self.removals.iter() {
            integrity::ensure(
                || self.remote.has(key),
                || IntegrityViolation::IndexDesync(key.lid().clone()),
            )?;
        }
        integrity::ensure_unique(self.data())
    }
}
