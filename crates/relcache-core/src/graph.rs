// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The relationship graph: owner of every edge.
//!
//! Edges are keyed by `(owner lid, field)` and created lazily the first time a
//! field is read or written. An edge never points at its inverse; the inverse
//! is found by looking up `(member lid, inverse field)` whenever it is needed,
//! so reflexive and cyclic relationships need no special handling.
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::instrument;

use crate::config::{DuplicatePolicy, GraphConfig};
use crate::definition::{self, ResolvedDefinition};
use crate::edge::{Edge, RelationshipView, ToManyEdge, ToOneEdge};
use crate::error::{ContractViolation, GraphError, IntegrityViolation, SchemaError};
use crate::ident::{Lid, ResourceKey};
use crate::integrity;
use crate::notify::{NotificationQueue, NotificationSink};
use crate::payload::EdgeData;
use crate::schema::{RelationshipKind, SchemaProvider};
use crate::telemetry;
use crate::tracked::MembershipChanges;

type EdgeMap = FxHashMap<Arc<str>, Edge>;

/// Relationship graph for one cache session.
///
/// Owns every [`Edge`], the resolved-definition cache, and the notification
/// queue. All mutation goes through the graph so both sides of a relationship
/// stay in step. Notifications are coalesced per settle: one public call, or
/// one [`Graph::batch`].
#[derive(Debug)]
pub struct Graph<S, N> {
    schema: S,
    sink: N,
    config: GraphConfig,
    pub(crate) edges: FxHashMap<Lid, EdgeMap>,
    definitions: FxHashMap<Arc<str>, FxHashMap<Arc<str>, Arc<ResolvedDefinition>>>,
    /// Member lid -> `(owner, field)` pairs of inverse-less edges holding it.
    pub(crate) implicit: FxHashMap<Lid, FxHashSet<(ResourceKey, Arc<str>)>>,
    polymorphic: FxHashSet<(Arc<str>, Arc<str>)>,
    pub(crate) queue: NotificationQueue,
    depth: usize,
}

impl<S, N> Graph<S, N>
where
    S: SchemaProvider,
    N: NotificationSink,
{
    /// Creates a graph with the default configuration.
    pub fn new(schema: S, sink: N) -> Self {
        Self::with_config(schema, sink, GraphConfig::default())
    }

    /// Creates a graph with an explicit configuration.
    pub fn with_config(schema: S, sink: N, config: GraphConfig) -> Self {
        Self {
            schema,
            sink,
            config,
            edges: FxHashMap::default(),
            definitions: FxHashMap::default(),
            implicit: FxHashMap::default(),
            polymorphic: FxHashSet::default(),
            queue: NotificationQueue::default(),
            depth: 0,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Schema provider.
    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Notification sink.
    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Notification sink, mutably (e.g. to drain a recording sink in tests).
    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }

    /// Ends the session, handing back the schema and the sink.
    pub fn into_parts(self) -> (S, N) {
        (self.schema, self.sink)
    }

    /// Existing edge for `key.field`, without creating it.
    pub fn edge(&self, key: &ResourceKey, field: &str) -> Option<&Edge> {
        self.edges.get(key.lid()).and_then(|edges| edges.get(field))
    }

    /// Number of materialized edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(FxHashMap::len).sum()
    }

    /// `true` once `subtype` has been accepted for a polymorphic field
    /// targeting `base`.
    pub fn is_registered_subtype(&self, base: &str, subtype: &str) -> bool {
        self.polymorphic
            .contains(&(Arc::<str>::from(base), Arc::<str>::from(subtype)))
    }

    // ── Settles ────────────────────────────────────────────────────────

    /// Runs `f` as a single settle: notifications raised inside it are
    /// flushed once, when the outermost batch exits. They are flushed even
    /// when `f` fails, so partial changes are still observed.
    pub fn batch<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, GraphError>,
    ) -> Result<T, GraphError> {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        if self.depth == 0 {
            self.queue.flush(&mut self.sink);
        }
        result
    }

    pub(crate) fn touched(&mut self, key: &ResourceKey, field: &Arc<str>) {
        self.queue.enqueue(key, field);
    }

    // ── Definitions and edges ──────────────────────────────────────────

    /// Resolved definition of `ty.field`, cached after the first success.
    pub(crate) fn definition(
        &mut self,
        ty: &str,
        field: &str,
    ) -> Result<Arc<ResolvedDefinition>, SchemaError> {
        if let Some(found) = self.definitions.get(ty).and_then(|fields| fields.get(field)) {
            return Ok(Arc::clone(found));
        }
        let resolved = definition::resolve(&self.schema, ty, field).map_err(|error| {
            telemetry::schema_rejected(&error);
            error
        })?;
        let resolved = Arc::new(resolved);
        self.definitions
            .entry(Arc::clone(&resolved.origin_type))
            .or_default()
            .insert(Arc::clone(&resolved.key), Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Edge for `key.field`, created on first touch.
    pub(crate) fn edge_mut(&mut self, key: &ResourceKey, field: &str) -> Result<&mut Edge, GraphError> {
        let definition = self.definition(key.ty(), field)?;
        let field = Arc::clone(&definition.key);
        Ok(self
            .edges
            .entry(key.lid().clone())
            .or_default()
            .entry(field)
            .or_insert_with(|| Edge::new(key.clone(), definition)))
    }

    /// Edge for `lid.field` if it has been materialized.
    pub(crate) fn existing_edge_mut(&mut self, lid: &Lid, field: &str) -> Option<&mut Edge> {
        self.edges.get_mut(lid).and_then(|edges| edges.get_mut(field))
    }

    pub(crate) fn to_many_mut(
        &mut self,
        key: &ResourceKey,
        field: &str,
        op: &'static str,
    ) -> Result<&mut ToManyEdge, GraphError> {
        match self.edge_mut(key, field)? {
            Edge::ToMany(edge) => Ok(edge),
            Edge::ToOne(_) => Err(kind_mismatch(op, field, RelationshipKind::ToOne)),
        }
    }

    pub(crate) fn to_one_mut(
        &mut self,
        key: &ResourceKey,
        field: &str,
        op: &'static str,
    ) -> Result<&mut ToOneEdge, GraphError> {
        match self.edge_mut(key, field)? {
            Edge::ToOne(edge) => Ok(edge),
            Edge::ToMany(_) => Err(kind_mismatch(op, field, RelationshipKind::ToMany)),
        }
    }

    // ── Admission of incoming members ──────────────────────────────────

    /// Checks that `member` may be stored in a field with `definition`.
    ///
    /// A polymorphic field accepts declared subtypes of its base type; the
    /// first acceptance of each subtype is remembered so later members skip
    /// the schema query.
    pub(crate) fn check_member_type(
        &mut self,
        definition: &ResolvedDefinition,
        member: &ResourceKey,
    ) -> Result<(), SchemaError> {
        if *definition.target_type == *member.ty() {
            return Ok(());
        }
        let error = if definition.is_polymorphic {
            let pair = (Arc::clone(&definition.target_type), member.ty_arc());
            if self.polymorphic.contains(&pair) {
                return Ok(());
            }
            if self.schema.is_subtype_of(member.ty(), &definition.target_type) {
                telemetry::polymorphic_registered(&definition.target_type, member.ty());
                self.polymorphic.insert(pair);
                return Ok(());
            }
            SchemaError::InvalidPolymorphicType {
                ty: definition.origin_type.to_string(),
                field: definition.key.to_string(),
                base: definition.target_type.to_string(),
                found: member.ty().to_string(),
            }
        } else {
            SchemaError::InvalidRelatedType {
                ty: definition.origin_type.to_string(),
                field: definition.key.to_string(),
                expected: definition.target_type.to_string(),
                found: member.ty().to_string(),
            }
        };
        telemetry::schema_rejected(&error);
        Err(error)
    }

    /// Applies the duplicate policy and type checks to an incoming list.
    pub(crate) fn admit(
        &mut self,
        owner: &ResourceKey,
        definition: &ResolvedDefinition,
        keys: Vec<ResourceKey>,
    ) -> Result<Vec<ResourceKey>, GraphError> {
        let mut seen: FxHashSet<Lid> = FxHashSet::default();
        let mut admitted = Vec::with_capacity(keys.len());
        let mut dropped = Vec::new();
        for key in keys {
            if seen.insert(key.lid().clone()) {
                admitted.push(key);
            } else {
                dropped.push(key.lid().clone());
            }
        }
        if let Some(first) = dropped.first() {
            match self.config.duplicate_members {
                DuplicatePolicy::Reject => {
                    return Err(ContractViolation::DuplicateIncoming(first.clone()).into());
                }
                DuplicatePolicy::Dedupe => {
                    telemetry::duplicate_members_dropped(owner, &definition.key, &dropped);
                }
            }
        }
        for key in &admitted {
            self.check_member_type(definition, key)?;
        }
        Ok(admitted)
    }

    /// Validates a to-one candidate list, returning its single member.
    pub(crate) fn admit_one(
        &mut self,
        definition: &ResolvedDefinition,
        keys: Vec<ResourceKey>,
    ) -> Result<Option<ResourceKey>, GraphError> {
        if keys.len() > 1 {
            return Err(ContractViolation::Cardinality {
                field: definition.key.to_string(),
                count: keys.len(),
            }
            .into());
        }
        let next = keys.into_iter().next();
        if let Some(member) = &next {
            self.check_member_type(definition, member)?;
        }
        Ok(next)
    }

    // ── Public operations ──────────────────────────────────────────────

    /// Local bulk mutation: makes the effective membership equal `keys`.
    ///
    /// For a to-one field `keys` holds at most one member.
    #[instrument(skip_all, fields(ty = %key.ty(), lid = %key.lid(), field = %field))]
    pub fn set_state(&mut self, key: &ResourceKey, field: &str, keys: Vec<ResourceKey>) -> Result<(), GraphError> {
        self.batch(|graph| {
            let definition = graph.definition(key.ty(), field)?;
            let changed = match definition.kind {
                RelationshipKind::ToMany => {
                    let keys = graph.admit(key, &definition, keys)?;
                    graph.replace_records(key, &definition, keys, false)?
                }
                RelationshipKind::ToOne => {
                    let next = graph.admit_one(&definition, keys)?;
                    graph.replace_resource(key, &definition, next, false)?
                }
            };
            if changed {
                graph.touched(key, &definition.key);
            }
            Ok(())
        })
    }

    /// Local addition of `keys` to a to-many field.
    #[instrument(skip_all, fields(ty = %key.ty(), lid = %key.lid(), field = %field))]
    pub fn add_to_relationship(
        &mut self,
        key: &ResourceKey,
        field: &str,
        keys: Vec<ResourceKey>,
    ) -> Result<(), GraphError> {
        self.batch(|graph| graph.add_to_related(key, field, keys, false))
    }

    /// Local removal of `keys` from a to-many field.
    #[instrument(skip_all, fields(ty = %key.ty(), lid = %key.lid(), field = %field))]
    pub fn remove_from_relationship(
        &mut self,
        key: &ResourceKey,
        field: &str,
        keys: Vec<ResourceKey>,
    ) -> Result<(), GraphError> {
        self.batch(|graph| graph.remove_from_related(key, field, keys, false))
    }

    /// Local replacement of a to-many field's membership.
    #[instrument(skip_all, fields(ty = %key.ty(), lid = %key.lid(), field = %field))]
    pub fn replace_relationship(
        &mut self,
        key: &ResourceKey,
        field: &str,
        keys: Vec<ResourceKey>,
    ) -> Result<(), GraphError> {
        self.batch(|graph| graph.replace_related_records(key, field, keys, false))
    }

    /// Local replacement of a to-one field's member.
    #[instrument(skip_all, fields(ty = %key.ty(), lid = %key.lid(), field = %field))]
    pub fn replace_related_resource(
        &mut self,
        key: &ResourceKey,
        field: &str,
        value: Option<ResourceKey>,
    ) -> Result<(), GraphError> {
        self.batch(|graph| graph.replace_related_record(key, field, value, false))
    }

    /// Read view of `key.field`. Materializes the edge.
    pub fn get_relationship(&mut self, key: &ResourceKey, field: &str) -> Result<RelationshipView, GraphError> {
        Ok(self.edge_mut(key, field)?.view())
    }

    /// Effective members of `key.field`. Materializes the edge.
    pub fn data(&mut self, key: &ResourceKey, field: &str) -> Result<EdgeData, GraphError> {
        Ok(self.edge_mut(key, field)?.data())
    }

    /// Remote state and pending overlay of `key.field`.
    ///
    /// For a to-one field, a diverged local value is reported as a pending
    /// addition and the remote value it replaces as a pending removal.
    pub fn get_changes(&mut self, key: &ResourceKey, field: &str) -> Result<MembershipChanges, GraphError> {
        Ok(match self.edge_mut(key, field)? {
            Edge::ToMany(edge) => edge.members().changes(),
            Edge::ToOne(edge) => {
                let canonical: Vec<ResourceKey> = edge.remote().into_iter().cloned().collect();
                if edge.is_dirty() {
                    MembershipChanges {
                        additions: edge.local().into_iter().cloned().collect(),
                        removals: canonical.clone(),
                        canonical,
                    }
                } else {
                    MembershipChanges {
                        canonical,
                        ..MembershipChanges::default()
                    }
                }
            }
        })
    }

    /// `true` when `key.field` has uncommitted local changes. Never
    /// materializes the edge.
    pub fn is_dirty(&self, key: &ResourceKey, field: &str) -> bool {
        self.edge(key, field).is_some_and(Edge::is_dirty)
    }

    /// Records a failed load of `key.field` reported by the request layer.
    pub fn mark_load_failed(&mut self, key: &ResourceKey, field: &str) -> Result<(), GraphError> {
        self.batch(|graph| {
            let edge = graph.edge_mut(key, field)?;
            let state = &mut edge.header_mut().state;
            if state.has_failed_load_attempt {
                return Ok(());
            }
            state.has_failed_load_attempt = true;
            let field = Arc::clone(&edge.header().definition.key);
            graph.touched(key, &field);
            Ok(())
        })
    }

    /// Asks that the next read of `key.field` reload it.
    pub fn mark_force_reload(&mut self, key: &ResourceKey, field: &str) -> Result<(), GraphError> {
        self.edge_mut(key, field)?.header_mut().state.should_force_reload = true;
        Ok(())
    }

    /// Re-verifies overlay invariants of every edge and the symmetry of every
    /// effective membership with its inverse.
    ///
    /// Symmetry holds for graphs driven by local operations and complete
    /// remote pushes. A to-one edge that keeps a diverging local value across
    /// a remote update is a deliberate exception and reports here.
    pub fn verify(&self) -> Result<(), GraphError> {
        if !integrity::checks_enabled() {
            return Ok(());
        }
        for edges in self.edges.values() {
            for edge in edges.values() {
                if let Edge::ToMany(edge) = edge {
                    edge.members().verify()?;
                }
                self.verify_inverse(edge)?;
            }
        }
        Ok(())
    }

    fn verify_inverse(&self, edge: &Edge) -> Result<(), GraphError> {
        let header = edge.header();
        let Some(inverse) = &header.definition.inverse else {
            return Ok(());
        };
        for member in edge.data().into_keys() {
            let mirrored = self
                .edge(&member, &inverse.key)
                .is_some_and(|partner| partner.has(&header.identifier));
            integrity::ensure(
                || mirrored,
                || IntegrityViolation::AsymmetricInverse {
                    owner: header.identifier.lid().clone(),
                    field: header.definition.key.to_string(),
                    member: member.lid().clone(),
                },
            )?;
        }
        Ok(())
    }
}

fn kind_mismatch(op: &'static str, field: &str, kind: RelationshipKind) -> GraphError {
    ContractViolation::KindMismatch {
        op,
        field: field.to_string(),
        kind,
    }
    .into()
}
