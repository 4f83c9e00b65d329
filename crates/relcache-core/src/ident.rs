// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity types: local ids, resource keys, and wire references.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Locally unique, stable token for one logical resource.
///
/// A `Lid` is assigned exactly once per resource by the identity registry and
/// never reused. Equality, hashing, and ordering are by the token text.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lid(Arc<str>);

impl Lid {
    /// Wraps `token` as a lid.
    ///
    /// # Errors
    /// Returns [`IdentityError::EmptyLid`] when `token` is empty.
    pub fn new(token: &str) -> Result<Self, IdentityError> {
        if token.is_empty() {
            return Err(IdentityError::EmptyLid);
        }
        Ok(Self(Arc::from(token)))
    }

    /// Returns the lid text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Lid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Lid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct KeyData {
    ty: Arc<str>,
    lid: Lid,
    id: OnceLock<Arc<str>>,
}

/// Stable identity of a cached resource.
///
/// Cloning is cheap and every clone shares the same underlying identity, so an
/// id assigned after creation (see [`ResourceKey::assign_id`]) is observed by
/// every holder. Two keys compare equal iff their lids are equal, even when
/// they were minted as different allocations.
#[derive(Clone)]
pub struct ResourceKey(Arc<KeyData>);

impl ResourceKey {
    /// Builds a key for a persisted resource.
    ///
    /// # Errors
    /// Returns [`IdentityError::EmptyType`] for an empty type.
    pub fn persisted(ty: &str, id: &str, lid: Lid) -> Result<Self, IdentityError> {
        let key = Self::provisional(ty, lid)?;
        key.assign_id(id)?;
        Ok(key)
    }

    /// Builds a key for a resource that has no server id yet.
    ///
    /// # Errors
    /// Returns [`IdentityError::EmptyType`] for an empty type.
    pub fn provisional(ty: &str, lid: Lid) -> Result<Self, IdentityError> {
        if ty.is_empty() {
            return Err(IdentityError::EmptyType);
        }
        Ok(Self(Arc::new(KeyData {
            ty: Arc::from(ty),
            lid,
            id: OnceLock::new(),
        })))
    }

    /// Concrete resource type.
    #[must_use]
    pub fn ty(&self) -> &str {
        &self.0.ty
    }

    /// Shared handle to the type name, for use as a map key.
    #[must_use]
    pub fn ty_arc(&self) -> Arc<str> {
        Arc::clone(&self.0.ty)
    }

    /// Server-assigned id, if the resource has been persisted.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.id.get().map(|id| &**id)
    }

    /// Local identity token.
    #[must_use]
    pub fn lid(&self) -> &Lid {
        &self.0.lid
    }

    /// `true` while the resource has no server id.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.0.id.get().is_none()
    }

    /// Assigns the server id. Ids are write-once; re-assigning the same id is
    /// a no-op.
    ///
    /// # Errors
    /// Returns [`IdentityError::IdReassigned`] when a different id is already
    /// present.
    pub fn assign_id(&self, id: &str) -> Result<(), IdentityError> {
        let current = self.0.id.get_or_init(|| Arc::from(id));
        if &**current == id {
            Ok(())
        } else {
            Err(IdentityError::IdReassigned {
                lid: self.0.lid.clone(),
                current: current.to_string(),
                requested: id.to_string(),
            })
        }
    }
}

impl PartialEq for ResourceKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.lid == other.0.lid
    }
}

impl Eq for ResourceKey {}

impl Hash for ResourceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.lid.hash(state);
    }
}

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}:{} ({})", self.ty(), id, self.lid()),
            None => write!(f, "{}:<new> ({})", self.ty(), self.lid()),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}:{id}", self.ty()),
            None => write!(f, "{}:{}", self.ty(), self.lid()),
        }
    }
}

/// Resource reference as it appears inside a relationship payload.
///
/// Mirrors the JSON:API resource identifier object. At least one of `id` or
/// `lid` is required to resolve the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Resource type.
    #[serde(rename = "type")]
    pub ty: String,
    /// Server id, when persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Local id, when the sender knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lid: Option<String>,
}

impl ResourceRef {
    /// Reference by type and server id.
    pub fn new(ty: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            id: Some(id.into()),
            lid: None,
        }
    }

    /// Reference by type and local id only.
    pub fn local(ty: impl Into<String>, lid: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            id: None,
            lid: Some(lid.into()),
        }
    }
}
