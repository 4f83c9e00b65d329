// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-resource, per-field relationship state.
//!
//! An [`Edge`] is a closed two-variant type sharing an [`EdgeHeader`]; every
//! operation matches on it exhaustively.
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::definition::ResolvedDefinition;
use crate::ident::ResourceKey;
use crate::payload::EdgeData;
use crate::schema::RelationshipKind;

mod to_many;
mod to_one;

pub use to_many::ToManyEdge;
pub use to_one::ToOneEdge;

/// Lifecycle flags of an edge. Independent booleans, not exclusive modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EdgeState {
    /// Remote data has been received at least once.
    pub has_received_data: bool,
    /// The last remote data was empty.
    pub is_empty: bool,
    /// A new related link arrived without data; members may be out of date.
    pub is_stale: bool,
    /// The request layer reported a failed load.
    pub has_failed_load_attempt: bool,
    /// The request layer asked for the next read to reload.
    pub should_force_reload: bool,
    /// A member was unloaded while this (async) edge still referenced it.
    pub has_dematerialized_inverse: bool,
}

/// Fields shared by both edge kinds.
#[derive(Debug, Clone)]
pub struct EdgeHeader {
    /// Owning resource.
    pub identifier: ResourceKey,
    /// Resolved definition shared by all edges of this field.
    pub definition: Arc<ResolvedDefinition>,
    /// Last received `meta`.
    pub meta: Option<Value>,
    /// Last received `links`.
    pub links: Option<Value>,
    /// Lifecycle flags.
    pub state: EdgeState,
}

impl EdgeHeader {
    fn new(identifier: ResourceKey, definition: Arc<ResolvedDefinition>) -> Self {
        Self {
            identifier,
            definition,
            meta: None,
            links: None,
            state: EdgeState::default(),
        }
    }
}

/// Relationship state bucket.
#[derive(Debug, Clone)]
pub enum Edge {
    /// Single optional member.
    ToOne(ToOneEdge),
    /// Ordered membership with a local overlay.
    ToMany(ToManyEdge),
}

impl Edge {
    pub(crate) fn new(identifier: ResourceKey, definition: Arc<ResolvedDefinition>) -> Self {
        let kind = definition.kind;
        let header = EdgeHeader::new(identifier, definition);
        match kind {
            RelationshipKind::ToOne => Self::ToOne(ToOneEdge::new(header)),
            RelationshipKind::ToMany => Self::ToMany(ToManyEdge::new(header)),
        }
    }

    /// Shared header.
    #[must_use]
    pub fn header(&self) -> &EdgeHeader {
        match self {
            Self::ToOne(edge) => &edge.header,
            Self::ToMany(edge) => &edge.header,
        }
    }

    pub(crate) fn header_mut(&mut self) -> &mut EdgeHeader {
        match self {
            Self::ToOne(edge) => &mut edge.header,
            Self::ToMany(edge) => &mut edge.header,
        }
    }

    /// Cardinality.
    #[must_use]
    pub fn kind(&self) -> RelationshipKind {
        match self {
            Self::ToOne(_) => RelationshipKind::ToOne,
            Self::ToMany(_) => RelationshipKind::ToMany,
        }
    }

    /// Effective members.
    #[must_use]
    pub fn data(&self) -> EdgeData {
        match self {
            Self::ToOne(edge) => EdgeData::One(edge.local().cloned()),
            Self::ToMany(edge) => EdgeData::Many(edge.members().data().to_vec()),
        }
    }

    /// Effective membership test.
    #[must_use]
    pub fn has(&self, key: &ResourceKey) -> bool {
        match self {
            Self::ToOne(edge) => edge.local() == Some(key),
            Self::ToMany(edge) => edge.members().has(key),
        }
    }

    /// Every key held in any layer (remote, local, overlay).
    pub(crate) fn referenced(&self) -> Vec<ResourceKey> {
        match self {
            Self::ToOne(edge) => {
                let mut keys: Vec<ResourceKey> = edge.remote().into_iter().cloned().collect();
                if let Some(local) = edge.local() {
                    if edge.remote() != Some(local) {
                        keys.push(local.clone());
                    }
                }
                keys
            }
            Self::ToMany(edge) => {
                let members = edge.members();
                let mut keys = members.canonical();
                keys.extend(members.pending_additions());
                keys
            }
        }
    }

    /// Re-derives `is_empty` from the remote layer once data has arrived.
    pub(crate) fn refresh_is_empty(&mut self) {
        let remote_empty = match self {
            Self::ToOne(edge) => edge.remote().is_none(),
            Self::ToMany(edge) => edge.members().canonical_is_empty(),
        };
        let state = &mut self.header_mut().state;
        if state.has_received_data {
            state.is_empty = remote_empty;
        }
    }

    /// `true` if `key` appears in any layer.
    pub(crate) fn references(&self, key: &ResourceKey) -> bool {
        match self {
            Self::ToOne(edge) => edge.remote() == Some(key) || edge.local() == Some(key),
            Self::ToMany(edge) => edge.members().references(key),
        }
    }

    /// Overlay non-empty (to-many) or local differs from remote (to-one).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        match self {
            Self::ToOne(edge) => edge.is_dirty(),
            Self::ToMany(edge) => edge.members().is_dirty(),
        }
    }

    /// Snapshot for readers.
    #[must_use]
    pub fn view(&self) -> RelationshipView {
        let header = self.header();
        let data = self.data();
        let known = !header.definition.is_async || header.state.has_received_data || !data.is_empty();
        RelationshipView {
            data: known.then_some(data),
            links: header.links.clone(),
            meta: header.meta.clone(),
            state: header.state,
            is_async: header.definition.is_async,
        }
    }
}

/// What a reader sees for one relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipView {
    /// Effective members, or `None` while an async relationship has nothing
    /// known about it.
    pub data: Option<EdgeData>,
    /// Last received links.
    pub links: Option<Value>,
    /// Last received meta.
    pub meta: Option<Value>,
    /// Lifecycle flags.
    pub state: EdgeState,
    /// Whether the relationship loads lazily.
    pub is_async: bool,
}

impl RelationshipView {
    /// Whether the request layer should fetch this relationship before the
    /// data is trusted.
    #[must_use]
    pub fn needs_fetch(&self) -> bool {
        let state = &self.state;
        state.should_force_reload
            || (self.is_async
                && (!state.has_received_data
                    || state.is_stale
                    || state.has_failed_load_attempt
                    || state.has_dematerialized_inverse))
    }
}
