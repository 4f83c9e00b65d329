// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::ident::ResourceKey;

use super::EdgeHeader;

/// To-one relationship: a remote value and a local (effective) value.
///
/// `local` equals `remote` unless a local mutation is pending.
#[derive(Debug, Clone)]
pub struct ToOneEdge {
    pub(crate) header: EdgeHeader,
    remote: Option<ResourceKey>,
    local: Option<ResourceKey>,
}

impl ToOneEdge {
    pub(super) fn new(header: EdgeHeader) -> Self {
        Self {
            header,
            remote: None,
            local: None,
        }
    }

    /// Server-confirmed member.
    #[must_use]
    pub fn remote(&self) -> Option<&ResourceKey> {
        self.remote.as_ref()
    }

    /// Effective member.
    #[must_use]
    pub fn local(&self) -> Option<&ResourceKey> {
        self.local.as_ref()
    }

    /// `true` while the local value diverges from the remote one.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.local != self.remote
    }

    pub(crate) fn set_remote(&mut self, value: Option<ResourceKey>) -> Option<ResourceKey> {
        std::mem::replace(&mut self.remote, value)
    }

    pub(crate) fn set_local(&mut self, value: Option<ResourceKey>) -> Option<ResourceKey> {
        std::mem::replace(&mut self.local, value)
    }

    /// Resets local to remote. Returns the discarded local value when it
    /// differed.
    pub(crate) fn rollback(&mut self) -> Option<Option<ResourceKey>> {
        if !self.is_dirty() {
            return None;
        }
        Some(std::mem::replace(&mut self.local, self.remote.clone()))
    }

    /// Swaps `old` for `new`. Returns `(touched, diverged)`: whether anything
    /// changed, and whether a pending local value referenced `old`.
    pub(crate) fn relabel(&mut self, old: &ResourceKey, new: &ResourceKey) -> (bool, bool) {
        let was_dirty = self.is_dirty();
        let mut touched = false;
        let mut diverged = false;
        if self.remote.as_ref() == Some(old) {
            self.remote = Some(new.clone());
            touched = true;
        }
        if self.local.as_ref() == Some(old) {
            self.local = Some(new.clone());
            touched = true;
            diverged = was_dirty;
        }
        (touched, diverged)
    }

    /// Drops `key` from both slots. Returns `true` if it was the effective
    /// value.
    pub(crate) fn remove_completely(&mut self, key: &ResourceKey) -> bool {
        if self.remote.as_ref() == Some(key) {
            self.remote = None;
        }
        if self.local.as_ref() == Some(key) {
            self.local = None;
            return true;
        }
        false
    }
}
