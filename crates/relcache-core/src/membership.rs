// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ordered membership set with O(1) lookup and whole-state diffing.
use rustc_hash::FxHashMap;

use crate::error::{ContractViolation, GraphError};
use crate::ident::{Lid, ResourceKey};
use crate::integrity;

/// Tombstones tolerated before a removal compacts the backing order.
const COMPACT_SLACK: usize = 16;

/// Set-difference between two membership states.
///
/// `additions` follow the order of the incoming state; `removals` follow the
/// order of the previous state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    /// Members present now that were absent before.
    pub additions: Vec<ResourceKey>,
    /// Members present before that are absent now.
    pub removals: Vec<ResourceKey>,
    /// Same members as before in a different order. Only set when nothing
    /// was added or removed.
    pub reordered: bool,
}

impl MembershipDiff {
    /// `true` when nothing changed, order included.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty() && !self.reordered
    }
}

/// Ordered collection of resource keys, unique by lid.
///
/// `index` maps each member's lid to its slot in `slots`; removed members
/// leave a tombstone until the next compaction. Every lid in `index` points
/// at a live slot holding that lid, and every live slot is indexed.
#[derive(Debug, Clone, Default)]
pub struct MembershipSet {
    slots: Vec<Option<ResourceKey>>,
    index: FxHashMap<Lid, usize>,
}

impl MembershipSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// `true` when there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// O(1) membership test.
    #[must_use]
    pub fn has(&self, key: &ResourceKey) -> bool {
        self.index.contains_key(key.lid())
    }

    /// Iterates members in order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceKey> {
        self.slots.iter().flatten()
    }

    /// Members in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ResourceKey> {
        self.iter().cloned().collect()
    }

    /// Replaces the whole membership with `next` and returns what changed.
    ///
    /// Runs in O(n): one pass classifies the incoming values, a second pass
    /// over the previous order collects removals and stops as soon as the
    /// expected number has been found. When nothing was added or removed the
    /// two orders are compared instead. A repeated lid in `next` keeps its
    /// first occurrence.
    ///
    /// # Errors
    /// With integrity checks enabled, a repeated lid in `next` is reported as
    /// [`ContractViolation::DuplicateIncoming`] and the set is left untouched.
    pub fn push_state(&mut self, next: Vec<ResourceKey>) -> Result<MembershipDiff, GraphError> {
        let mut index: FxHashMap<Lid, usize> =
            FxHashMap::with_capacity_and_hasher(next.len(), Default::default());
        let mut slots = Vec::with_capacity(next.len());
        let mut additions = Vec::new();

        for key in next {
            if index.contains_key(key.lid()) {
                integrity::ensure(
                    || false,
                    || ContractViolation::DuplicateIncoming(key.lid().clone()),
                )?;
                continue;
            }
            if !self.index.contains_key(key.lid()) {
                additions.push(key.clone());
            }
            index.insert(key.lid().clone(), slots.len());
            slots.push(Some(key));
        }

        // First population: everything is an addition, nothing to diff.
        if self.index.is_empty() {
            self.slots = slots;
            self.index = index;
            return Ok(MembershipDiff {
                additions,
                ..MembershipDiff::default()
            });
        }

        let retained = index.len() - additions.len();
        let expected_removals = self.index.len() - retained;
        let mut removals = Vec::with_capacity(expected_removals);
        if expected_removals > 0 {
            for key in self.iter() {
                if !index.contains_key(key.lid()) {
                    removals.push(key.clone());
                    if removals.len() == expected_removals {
                        break;
                    }
                }
            }
        }
        let reordered = additions.is_empty()
            && removals.is_empty()
            && self
                .iter()
                .map(ResourceKey::lid)
                .ne(slots.iter().flatten().map(ResourceKey::lid));

        self.slots = slots;
        self.index = index;
        Ok(MembershipDiff {
            additions,
            removals,
            reordered,
        })
    }

    /// Appends `key`. Returns `false` (and changes nothing) if already present.
    pub fn add(&mut self, key: ResourceKey) -> bool {
        if self.index.contains_key(key.lid()) {
            return false;
        }
        self.index.insert(key.lid().clone(), self.slots.len());
        self.slots.push(Some(key));
        true
    }

    /// Removes `key`. Returns `false` if it was not a member.
    ///
    /// The slot is found through the index and left as a tombstone, so a
    /// removal is O(1) amortized over the compactions it triggers.
    pub fn remove(&mut self, key: &ResourceKey) -> bool {
        let Some(slot) = self.index.remove(key.lid()) else {
            return false;
        };
        match self.slots.get_mut(slot) {
            Some(entry) => *entry = None,
            None => debug_assert!(false, "membership index points past the order: {key:?}"),
        }
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        if self.slots.len() > 2 * self.index.len() + COMPACT_SLACK {
            self.compact();
        }
        true
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        for (slot, key) in self.slots.iter().flatten().enumerate() {
            if let Some(position) = self.index.get_mut(key.lid()) {
                *position = slot;
            }
        }
    }

    /// Swaps `old` for `new` in place, keeping its position.
    ///
    /// Returns `false` if `old` was not a member. If `new` is already a member
    /// the old entry is simply dropped.
    pub(crate) fn relabel(&mut self, old: &ResourceKey, new: &ResourceKey) -> bool {
        let Some(&slot) = self.index.get(old.lid()) else {
            return false;
        };
        if self.index.contains_key(new.lid()) {
            return self.remove(old);
        }
        self.index.remove(old.lid());
        self.index.insert(new.lid().clone(), slot);
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = Some(new.clone());
        }
        true
    }

    /// Empties the set, returning the previous members in order.
    pub fn take(&mut self) -> Vec<ResourceKey> {
        self.index.clear();
        std::mem::take(&mut self.slots).into_iter().flatten().collect()
    }
}
