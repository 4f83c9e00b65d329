// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single-edge primitives and inverse mirroring.
use std::sync::Arc;

use crate::definition::ResolvedDefinition;
use crate::edge::Edge;
use crate::error::GraphError;
use crate::graph::Graph;
use crate::ident::ResourceKey;
use crate::notify::NotificationSink;
use crate::schema::SchemaProvider;

impl<S, N> Graph<S, N>
where
    S: SchemaProvider,
    N: NotificationSink,
{
    /// Adds `member` to `key.field` only. Queues a notification when the
    /// effective state changed.
    ///
    /// Returns the value a to-one edge no longer holds in the touched layer,
    /// whose own inverse must now forget `key`.
    pub(crate) fn edge_add(
        &mut self,
        key: &ResourceKey,
        field: &str,
        member: &ResourceKey,
        remote: bool,
    ) -> Result<Option<ResourceKey>, GraphError> {
        let edge = self.edge_mut(key, field)?;
        let field = Arc::clone(&edge.header().definition.key);
        let (changed, displaced) = match edge {
            Edge::ToMany(edge) => {
                let changed = if remote {
                    let was_received = edge.header.state.has_received_data;
                    edge.header.state.has_received_data = true;
                    edge.header.state.is_empty = false;
                    edge.members_mut().add_remote(member.clone()) || !was_received
                } else if edge.members().has(member) {
                    false
                } else {
                    edge.members_mut().add(member.clone())?;
                    true
                };
                (changed, None)
            }
            Edge::ToOne(edge) if remote => {
                let was_received = edge.header.state.has_received_data;
                edge.header.state.has_received_data = true;
                edge.header.state.is_empty = false;
                if edge.remote() == Some(member) {
                    (!was_received, None)
                } else {
                    let previous = edge.set_remote(Some(member.clone()));
                    let follows_remote = edge.local() == previous.as_ref();
                    if follows_remote {
                        edge.set_local(Some(member.clone()));
                    }
                    (follows_remote || !was_received, previous)
                }
            }
            Edge::ToOne(edge) => {
                if edge.local() == Some(member) {
                    (false, None)
                } else {
                    (true, edge.set_local(Some(member.clone())))
                }
            }
        };
        if changed {
            self.touched(key, &field);
        }
        Ok(displaced)
    }

    /// Removes `member` from `key.field` only, if that edge exists. Queues a
    /// notification when the effective state changed.
    pub(crate) fn edge_remove(
        &mut self,
        key: &ResourceKey,
        field: &str,
        member: &ResourceKey,
        remote: bool,
    ) -> Result<bool, GraphError> {
        let Some(edge) = self.existing_edge_mut(key.lid(), field) else {
            return Ok(false);
        };
        let field = Arc::clone(&edge.header().definition.key);
        let was_received = edge.header().state.has_received_data;
        if remote {
            edge.header_mut().state.has_received_data = true;
        }
        let changed = match edge {
            Edge::ToMany(edge) if remote => edge.members_mut().remove_remote(member) || !was_received,
            Edge::ToMany(edge) => {
                if edge.members().has(member) {
                    edge.members_mut().remove(member)?;
                    true
                } else {
                    false
                }
            }
            Edge::ToOne(edge) if remote => {
                if edge.remote() == Some(member) {
                    edge.set_remote(None);
                    if edge.local() == Some(member) {
                        edge.set_local(None);
                        true
                    } else {
                        !was_received
                    }
                } else {
                    !was_received
                }
            }
            Edge::ToOne(edge) => {
                if edge.local() == Some(member) {
                    edge.set_local(None);
                    true
                } else {
                    false
                }
            }
        };
        if remote {
            edge.refresh_is_empty();
        }
        if changed {
            self.touched(key, &field);
        }
        Ok(changed)
    }

    /// Mirrors "`owner.field` gained `member`" onto `member`'s inverse edge.
    ///
    /// A to-one inverse that already pointed elsewhere drops that value, and
    /// the displaced resource's edge forgets `member`.
    pub(crate) fn add_to_inverse(
        &mut self,
        owner: &ResourceKey,
        definition: &ResolvedDefinition,
        member: &ResourceKey,
        remote: bool,
    ) -> Result<(), GraphError> {
        let Some(inverse) = &definition.inverse else {
            self.track_implicit(member, owner, &definition.key);
            return Ok(());
        };
        let displaced = self.edge_add(member, &inverse.key, owner, remote)?;
        if let Some(displaced) = displaced.filter(|displaced| displaced != owner) {
            self.edge_remove(&displaced, &definition.key, member, remote)?;
        }
        Ok(())
    }

    /// Mirrors "`owner.field` lost `member`" onto `member`'s inverse edge.
    pub(crate) fn remove_from_inverse(
        &mut self,
        owner: &ResourceKey,
        definition: &ResolvedDefinition,
        member: &ResourceKey,
        remote: bool,
    ) -> Result<(), GraphError> {
        match &definition.inverse {
            Some(inverse) => {
                self.edge_remove(member, &inverse.key, owner, remote)?;
            }
            None => self.untrack_implicit_if_unreferenced(member, owner, &definition.key),
        }
        Ok(())
    }

    /// Drops `owner` from every layer of `member`'s inverse edge.
    pub(crate) fn detach_partner(
        &mut self,
        owner: &ResourceKey,
        definition: &ResolvedDefinition,
        member: &ResourceKey,
    ) {
        match &definition.inverse {
            Some(inverse) => self.drop_member(member, &inverse.key, owner),
            None => self.untrack_implicit(member, owner, &definition.key),
        }
    }

    /// Drops `member` from every layer of `key.field`, if that edge exists.
    pub(crate) fn drop_member(&mut self, key: &ResourceKey, field: &str, member: &ResourceKey) {
        let Some(edge) = self.existing_edge_mut(key.lid(), field) else {
            return;
        };
        let field = Arc::clone(&edge.header().definition.key);
        let changed = match edge {
            Edge::ToMany(edge) => edge.members_mut().remove_completely(member),
            Edge::ToOne(edge) => edge.remove_completely(member),
        };
        edge.refresh_is_empty();
        if changed {
            self.touched(key, &field);
        }
    }

    // ── Implicit reverse index ─────────────────────────────────────────

    pub(crate) fn track_implicit(&mut self, member: &ResourceKey, owner: &ResourceKey, field: &Arc<str>) {
        self.implicit
            .entry(member.lid().clone())
            .or_default()
            .insert((owner.clone(), Arc::clone(field)));
    }

    pub(crate) fn untrack_implicit(&mut self, member: &ResourceKey, owner: &ResourceKey, field: &Arc<str>) {
        if let Some(holders) = self.implicit.get_mut(member.lid()) {
            holders.remove(&(owner.clone(), Arc::clone(field)));
            if holders.is_empty() {
                self.implicit.remove(member.lid());
            }
        }
    }

    fn untrack_implicit_if_unreferenced(&mut self, member: &ResourceKey, owner: &ResourceKey, field: &Arc<str>) {
        let referenced = self
            .edge(owner, field)
            .is_some_and(|edge| edge.references(member));
        if !referenced {
            self.untrack_implicit(member, owner, field);
        }
    }

    /// Every `(owner, field)` of an inverse-less edge that may hold `member`.
    pub(crate) fn implicit_holders(&mut self, member: &ResourceKey) -> Vec<(ResourceKey, Arc<str>)> {
        self.implicit
            .remove(member.lid())
            .map(|holders| holders.into_iter().collect())
            .unwrap_or_default()
    }
}
