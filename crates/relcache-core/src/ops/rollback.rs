// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Discarding uncommitted local changes.
use std::sync::Arc;

use tracing::instrument;

use crate::definition::ResolvedDefinition;
use crate::edge::Edge;
use crate::error::GraphError;
use crate::graph::Graph;
use crate::ident::ResourceKey;
use crate::membership::MembershipDiff;
use crate::notify::NotificationSink;
use crate::schema::{RelationshipKind, SchemaProvider};

impl<S, N> Graph<S, N>
where
    S: SchemaProvider,
    N: NotificationSink,
{
    /// Discards the local changes of every materialized edge of `key`.
    #[instrument(skip_all, fields(ty = %key.ty(), lid = %key.lid()))]
    pub fn rollback(&mut self, key: &ResourceKey) -> Result<(), GraphError> {
        let fields: Vec<Arc<str>> = self
            .edges
            .get(key.lid())
            .map(|edges| edges.keys().cloned().collect())
            .unwrap_or_default();
        self.batch(|graph| {
            for field in &fields {
                graph.rollback_edge(key, field)?;
            }
            Ok(())
        })
    }

    /// Discards the local changes of `key.field`. The reversal is mirrored
    /// onto the inverse of every member whose effective state changed.
    #[instrument(skip_all, fields(ty = %key.ty(), lid = %key.lid(), field = %field))]
    pub fn rollback_relationship(&mut self, key: &ResourceKey, field: &str) -> Result<(), GraphError> {
        self.batch(|graph| {
            graph.definition(key.ty(), field)?;
            graph.rollback_edge(key, field)
        })
    }

    fn rollback_edge(&mut self, key: &ResourceKey, field: &str) -> Result<(), GraphError> {
        let Some(edge) = self.existing_edge_mut(key.lid(), field) else {
            return Ok(());
        };
        let definition = Arc::clone(&edge.header().definition);
        let reverted = match edge {
            Edge::ToMany(edge) => edge.members_mut().rollback(),
            Edge::ToOne(edge) => {
                let remote = edge.remote().cloned();
                match edge.rollback() {
                    Some(discarded) => MembershipDiff {
                        additions: remote.into_iter().collect(),
                        removals: discarded.into_iter().collect(),
                        ..MembershipDiff::default()
                    },
                    None => MembershipDiff::default(),
                }
            }
        };
        if reverted.is_empty() {
            return Ok(());
        }
        for member in &reverted.removals {
            self.restore_partner(key, &definition, member)?;
        }
        for member in &reverted.additions {
            self.add_to_inverse(key, &definition, member, false)?;
        }
        self.touched(key, &definition.key);
        Ok(())
    }

    /// Reverses the inverse side of a discarded local addition.
    ///
    /// When the inverse is to-one, the addition may have taken `member` away
    /// from another owner. The partner then returns to its remote value and
    /// that owner regains `member`.
    fn restore_partner(
        &mut self,
        owner: &ResourceKey,
        definition: &ResolvedDefinition,
        member: &ResourceKey,
    ) -> Result<(), GraphError> {
        let Some(inverse) = definition
            .inverse
            .as_ref()
            .filter(|inverse| inverse.kind == RelationshipKind::ToOne)
        else {
            return self.remove_from_inverse(owner, definition, member, false);
        };
        let Some(Edge::ToOne(partner)) = self.existing_edge_mut(member.lid(), &inverse.key) else {
            return Ok(());
        };
        if partner.local() != Some(owner) {
            return Ok(());
        }
        let previous = partner.remote().cloned();
        partner.rollback();
        self.touched(member, &inverse.key);
        if let Some(previous) = previous.filter(|previous| previous != owner) {
            let held = self
                .edge(&previous, &definition.key)
                .is_some_and(|edge| edge.has(member));
            if !held {
                self.edge_add(&previous, &definition.key, member, false)?;
            }
        }
        Ok(())
    }
}
