// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity merges: relabel, never re-diff.
use std::sync::Arc;

use crate::edge::Edge;
use crate::error::GraphError;
use crate::graph::Graph;
use crate::ident::{Lid, ResourceKey};
use crate::notify::NotificationSink;
use crate::schema::SchemaProvider;

impl<S, N> Graph<S, N>
where
    S: SchemaProvider,
    N: NotificationSink,
{
    /// Folds `abandoned` into `kept`.
    ///
    /// Fields only `abandoned` has move to `kept` as they are. Fields both
    /// have keep `kept`'s edge; the abandoned edge's members are detached from
    /// their partners. Every partner still referencing `abandoned` is then
    /// relabeled in place. Relabeling is not a content change: a partner is
    /// notified only when its pending local state referenced `abandoned`.
    pub(crate) fn merge_identifier(
        &mut self,
        kept: &ResourceKey,
        abandoned: &ResourceKey,
    ) -> Result<(), GraphError> {
        if kept == abandoned {
            return Ok(());
        }
        let abandoned_edges = self.edges.remove(abandoned.lid()).unwrap_or_default();
        for (field, mut edge) in abandoned_edges {
            let collides = self
                .edges
                .get(kept.lid())
                .is_some_and(|edges| edges.contains_key(&field));
            if collides {
                let definition = Arc::clone(&edge.header().definition);
                for member in edge.referenced() {
                    self.detach_partner(abandoned, &definition, &member);
                }
                continue;
            }
            if edge.header().definition.inverse.is_none() {
                for member in edge.referenced() {
                    self.untrack_implicit(&member, abandoned, &field);
                    self.track_implicit(&member, kept, &field);
                }
            }
            edge.header_mut().identifier = kept.clone();
            self.edges
                .entry(kept.lid().clone())
                .or_default()
                .insert(field, edge);
        }

        let fields: Vec<Arc<str>> = self
            .edges
            .get(kept.lid())
            .map(|edges| edges.keys().cloned().collect())
            .unwrap_or_default();
        for field in fields {
            self.relabel_in(kept.lid(), &field, abandoned, kept);
            let Some(edge) = self.edge(kept, &field) else {
                continue;
            };
            let Some(inverse) = edge.header().definition.inverse.clone() else {
                continue;
            };
            for member in edge.referenced() {
                self.relabel_in(member.lid(), &inverse.key, abandoned, kept);
            }
        }

        for (owner, field) in self.implicit_holders(abandoned) {
            let owner = if owner == *abandoned { kept.clone() } else { owner };
            self.relabel_in(owner.lid(), &field, abandoned, kept);
            self.track_implicit(kept, &owner, &field);
        }

        self.queue.relabel(abandoned, kept);
        Ok(())
    }

    fn relabel_in(&mut self, lid: &Lid, field: &str, old: &ResourceKey, new: &ResourceKey) {
        let Some(edge) = self.existing_edge_mut(lid, field) else {
            return;
        };
        let pending_touched = match edge {
            Edge::ToMany(edge) => edge.members_mut().relabel(old, new).overlay,
            Edge::ToOne(edge) => edge.relabel(old, new).1,
        };
        if pending_touched {
            let owner = edge.header().identifier.clone();
            let field = Arc::clone(&edge.header().definition.key);
            self.touched(&owner, &field);
        }
    }
}
