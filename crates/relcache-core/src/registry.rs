// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity registry port and the default in-memory implementation.
use rustc_hash::FxHashMap;

use crate::error::IdentityError;
use crate::ident::{Lid, ResourceKey, ResourceRef};
use crate::telemetry;

/// Result of reconciling a provisional identity with a persisted one.
///
/// Feed it to [`crate::Operation::MergeIdentifiers`] so the graph relabels
/// every edge that references `abandoned`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Identity that survives.
    pub kept: ResourceKey,
    /// Identity folded into `kept`.
    pub abandoned: ResourceKey,
}

/// Issues and tracks resource identities.
pub trait IdentityRegistry {
    /// Returns the identity for `reference`, minting one when unseen.
    fn identity_for(&mut self, reference: &ResourceRef) -> Result<ResourceKey, IdentityError>;

    /// Mints a provisional identity for a client-created resource.
    fn create_new(&mut self, ty: &str) -> Result<ResourceKey, IdentityError>;

    /// `true` while `key` has no server id.
    fn is_new(&self, key: &ResourceKey) -> bool {
        key.is_new()
    }

    /// Assigns a server id to `key`.
    ///
    /// Returns a [`MergeOutcome`] when another identity already owns the same
    /// `(type, id)`.
    fn update_id(&mut self, key: &ResourceKey, id: &str) -> Result<Option<MergeOutcome>, IdentityError>;

    /// Drops `key` from the registry (resource unloaded).
    fn forget(&mut self, key: &ResourceKey);
}

/// In-memory identity registry.
///
/// Persisted resources get the lid `@lid:{type}-{id}`; client-created ones get
/// `@lid:new:{type}-{n}` from a per-registry counter. Lids of abandoned
/// identities keep resolving to the identity they were merged into.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    by_lid: FxHashMap<Lid, ResourceKey>,
    by_id: FxHashMap<(String, String), ResourceKey>,
    redirects: FxHashMap<Lid, ResourceKey>,
    next_new: u64,
}

impl KeyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_lid.len()
    }

    /// `true` when no identity is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_lid.is_empty()
    }

    /// Looks up a live identity by lid, following merge redirects.
    #[must_use]
    pub fn get(&self, lid: &Lid) -> Option<&ResourceKey> {
        self.by_lid.get(lid).or_else(|| self.redirects.get(lid))
    }

    fn insert(&mut self, key: ResourceKey) -> ResourceKey {
        if let Some(id) = key.id() {
            self.by_id
                .insert((key.ty().to_string(), id.to_string()), key.clone());
        }
        self.by_lid.insert(key.lid().clone(), key.clone());
        key
    }
}

impl IdentityRegistry for KeyRegistry {
    fn identity_for(&mut self, reference: &ResourceRef) -> Result<ResourceKey, IdentityError> {
        if let Some(lid) = reference.lid.as_deref() {
            let lid = Lid::new(lid)?;
            if let Some(key) = self.get(&lid) {
                return Ok(key.clone());
            }
            if let Some(id) = reference.id.as_deref() {
                if let Some(key) = self.by_id.get(&(reference.ty.clone(), id.to_string())) {
                    return Ok(key.clone());
                }
                return Ok(self.insert(ResourceKey::persisted(&reference.ty, id, lid)?));
            }
            return Ok(self.insert(ResourceKey::provisional(&reference.ty, lid)?));
        }
        let Some(id) = reference.id.as_deref() else {
            return Err(IdentityError::Unidentifiable(reference.ty.clone()));
        };
        if let Some(key) = self.by_id.get(&(reference.ty.clone(), id.to_string())) {
            return Ok(key.clone());
        }
        let lid = Lid::new(&format!("@lid:{}-{id}", reference.ty))?;
        Ok(self.insert(ResourceKey::persisted(&reference.ty, id, lid)?))
    }

    fn create_new(&mut self, ty: &str) -> Result<ResourceKey, IdentityError> {
        self.next_new += 1;
        let lid = Lid::new(&format!("@lid:new:{ty}-{}", self.next_new))?;
        Ok(self.insert(ResourceKey::provisional(ty, lid)?))
    }

    fn update_id(&mut self, key: &ResourceKey, id: &str) -> Result<Option<MergeOutcome>, IdentityError> {
        if !self.by_lid.contains_key(key.lid()) {
            return Err(IdentityError::UnknownLid(key.lid().clone()));
        }
        if let Some(current) = key.id() {
            if current == id {
                return Ok(None);
            }
            return Err(IdentityError::IdReassigned {
                lid: key.lid().clone(),
                current: current.to_string(),
                requested: id.to_string(),
            });
        }
        let slot = (key.ty().to_string(), id.to_string());
        let existing = self.by_id.get(&slot).cloned();
        key.assign_id(id)?;
        self.by_id.insert(slot, key.clone());
        match existing {
            Some(existing) if existing != *key => {
                self.by_lid.remove(existing.lid());
                self.redirects.insert(existing.lid().clone(), key.clone());
                telemetry::identity_merged(key, &existing);
                Ok(Some(MergeOutcome {
                    kept: key.clone(),
                    abandoned: existing,
                }))
            }
            _ => Ok(None),
        }
    }

    fn forget(&mut self, key: &ResourceKey) {
        self.by_lid.remove(key.lid());
        if let Some(id) = key.id() {
            let slot = (key.ty().to_string(), id.to_string());
            if self.by_id.get(&slot) == Some(key) {
                self.by_id.remove(&slot);
            }
        }
        self.redirects.retain(|_, target| target != key);
    }
}
