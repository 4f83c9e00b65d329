// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Key minting and payload helpers.

use relcache_core::{
    EdgeData, EdgePayload, IdentityError, IdentityRegistry, KeyRegistry, ResourceKey, ResourceRef,
};

/// Mints [`ResourceKey`]s through a real [`KeyRegistry`], so keys for the
/// same `(type, id)` share one identity exactly as they would in a cache.
#[derive(Debug, Default)]
pub struct KeyFactory {
    registry: KeyRegistry,
}

impl KeyFactory {
    /// Create a factory with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persisted key for `ty:id`.
    pub fn key(&mut self, ty: &str, id: &str) -> Result<ResourceKey, IdentityError> {
        self.registry.identity_for(&ResourceRef::new(ty, id))
    }

    /// Persisted keys `ty:1..=n`.
    pub fn keys(&mut self, ty: &str, n: usize) -> Result<Vec<ResourceKey>, IdentityError> {
        (1..=n).map(|i| self.key(ty, &i.to_string())).collect()
    }

    /// Provisional key for a client-created `ty`.
    pub fn new_key(&mut self, ty: &str) -> Result<ResourceKey, IdentityError> {
        self.registry.create_new(ty)
    }

    /// The underlying registry.
    pub fn registry(&mut self) -> &mut KeyRegistry {
        &mut self.registry
    }
}

/// Payload carrying a to-many member list.
pub fn many(keys: &[ResourceKey]) -> EdgePayload {
    EdgePayload::with_data(EdgeData::Many(keys.to_vec()))
}

/// Payload carrying a to-one value.
pub fn one(key: &ResourceKey) -> EdgePayload {
    EdgePayload::with_data(EdgeData::One(Some(key.clone())))
}

/// Payload carrying an explicit `null` to-one value.
pub fn none() -> EdgePayload {
    EdgePayload::with_data(EdgeData::One(None))
}
