// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deletion and unload teardown.
use std::sync::Arc;

use tracing::instrument;

use crate::edge::Edge;
use crate::error::GraphError;
use crate::graph::Graph;
use crate::ident::ResourceKey;
use crate::notify::NotificationSink;
use crate::schema::SchemaProvider;
use crate::telemetry;

impl<S, N> Graph<S, N>
where
    S: SchemaProvider,
    N: NotificationSink,
{
    /// Tears down every edge of an evicted resource.
    ///
    /// Partners on sync relationships, and all partners of a resource that was
    /// never persisted, drop it entirely. Partners on async relationships keep
    /// the reference and are flagged `has_dematerialized_inverse` so the
    /// request layer knows to refetch. Inverse-less edges elsewhere that held
    /// the resource drop it.
    #[instrument(skip_all, fields(ty = %key.ty(), lid = %key.lid()))]
    pub fn unload(&mut self, key: &ResourceKey) -> Result<(), GraphError> {
        self.batch(|graph| {
            let edges = graph.edges.remove(key.lid()).unwrap_or_default();
            let count = edges.len();
            for (field, edge) in edges {
                let definition = Arc::clone(&edge.header().definition);
                for member in edge.referenced() {
                    if member == *key {
                        continue;
                    }
                    match &definition.inverse {
                        None => graph.untrack_implicit(&member, key, &field),
                        Some(inverse) if !inverse.is_async || key.is_new() => {
                            graph.drop_member(&member, &inverse.key, key);
                        }
                        Some(inverse) => graph.dematerialize(&member, &inverse.key),
                    }
                }
            }
            for (owner, field) in graph.implicit_holders(key) {
                graph.drop_member(&owner, &field, key);
            }
            graph.queue.forget(key);
            telemetry::resource_unloaded(key, count);
            Ok(())
        })
    }

    fn dematerialize(&mut self, key: &ResourceKey, field: &str) {
        let Some(edge) = self.existing_edge_mut(key.lid(), field) else {
            return;
        };
        let state = &mut edge.header_mut().state;
        if state.has_dematerialized_inverse {
            return;
        }
        state.has_dematerialized_inverse = true;
        let field = Arc::clone(&edge.header().definition.key);
        self.touched(key, &field);
    }

    /// Empties every edge of a deleted resource and detaches it from every
    /// partner, including inverse-less edges that held it.
    pub(crate) fn remove_from_partners(&mut self, key: &ResourceKey) -> Result<(), GraphError> {
        let fields: Vec<Arc<str>> = self
            .edges
            .get(key.lid())
            .map(|edges| edges.keys().cloned().collect())
            .unwrap_or_default();
        for field in fields {
            let Some(edge) = self.existing_edge_mut(key.lid(), &field) else {
                continue;
            };
            let definition = Arc::clone(&edge.header().definition);
            let had_members = !edge.data().is_empty();
            let members = match edge {
                Edge::ToMany(edge) => edge.members_mut().clear(),
                Edge::ToOne(edge) => {
                    let remote = edge.set_remote(None);
                    let local = edge.set_local(None).filter(|local| remote.as_ref() != Some(local));
                    remote.into_iter().chain(local).collect()
                }
            };
            if had_members {
                self.touched(key, &field);
            }
            for member in members.iter().filter(|member| *member != key) {
                self.detach_partner(key, &definition, member);
            }
        }
        for (owner, field) in self.implicit_holders(key) {
            self.drop_member(&owner, &field, key);
        }
        Ok(())
    }
}
