// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bulk replacement of a relationship's membership.
use rustc_hash::FxHashSet;

use crate::definition::ResolvedDefinition;
use crate::error::GraphError;
use crate::graph::Graph;
use crate::ident::{Lid, ResourceKey};
use crate::membership::MembershipDiff;
use crate::notify::NotificationSink;
use crate::schema::{RelationshipKind, SchemaProvider};

impl<S, N> Graph<S, N>
where
    S: SchemaProvider,
    N: NotificationSink,
{
    /// `replace-relationship` as an operation: kind check, admission, owner
    /// notification.
    pub(crate) fn replace_related_records(
        &mut self,
        key: &ResourceKey,
        field: &str,
        value: Vec<ResourceKey>,
        remote: bool,
    ) -> Result<(), GraphError> {
        let definition = self.definition(key.ty(), field)?;
        self.to_many_mut(key, field, "replace-relationship")?;
        let value = self.admit(key, &definition, value)?;
        if self.replace_records(key, &definition, value, remote)? {
            self.touched(key, &definition.key);
        }
        Ok(())
    }

    /// `replace-related-resource` as an operation.
    pub(crate) fn replace_related_record(
        &mut self,
        key: &ResourceKey,
        field: &str,
        value: Option<ResourceKey>,
        remote: bool,
    ) -> Result<(), GraphError> {
        let definition = self.definition(key.ty(), field)?;
        self.to_one_mut(key, field, "replace-related-resource")?;
        if let Some(member) = &value {
            self.check_member_type(&definition, member)?;
        }
        if self.replace_resource(key, &definition, value, remote)? {
            self.touched(key, &definition.key);
        }
        Ok(())
    }

    /// Replaces a to-many membership. Returns `true` when the owning edge
    /// should be notified; partner edges queue their own notifications.
    ///
    /// Remote: `next` becomes the remote state and the overlay is reconciled
    /// against it (or discarded under `clear_local_on_remote_update`); a
    /// reorder alone counts as a change. Local: `next` becomes the effective
    /// membership. Members already remote keep their remote position, since
    /// only the server orders them; pending additions follow the order they
    /// have in `next`.
    pub(crate) fn replace_records(
        &mut self,
        key: &ResourceKey,
        definition: &ResolvedDefinition,
        next: Vec<ResourceKey>,
        remote: bool,
    ) -> Result<bool, GraphError> {
        if remote {
            self.replace_records_remote(key, definition, next)
        } else {
            self.replace_records_local(key, definition, next)
        }
    }

    fn replace_records_remote(
        &mut self,
        key: &ResourceKey,
        definition: &ResolvedDefinition,
        next: Vec<ResourceKey>,
    ) -> Result<bool, GraphError> {
        let clear_local = self.config().clear_local_on_remote_update;
        let edge = self.to_many_mut(key, &definition.key, "replace-relationship")?;
        let was_received = edge.header.state.has_received_data;
        edge.header.state.has_received_data = true;
        let discarded = if clear_local {
            edge.members_mut().rollback()
        } else {
            MembershipDiff::default()
        };
        let update = edge.members_mut().push_state(next)?;
        edge.header.state.is_empty = edge.members().canonical_is_empty();
        // A first remote payload counts as a change even when it is empty,
        // so observers waiting on "unknown" hear about "known".
        let changed = !update.effective.is_empty() || !discarded.is_empty() || !was_received;

        for member in &discarded.removals {
            self.remove_from_inverse(key, definition, member, false)?;
        }
        for member in &discarded.additions {
            self.add_to_inverse(key, definition, member, false)?;
        }
        for member in &update.remote.removals {
            self.remove_from_inverse(key, definition, member, true)?;
        }
        for member in &update.remote.additions {
            self.add_to_inverse(key, definition, member, true)?;
        }
        Ok(changed)
    }

    fn replace_records_local(
        &mut self,
        key: &ResourceKey,
        definition: &ResolvedDefinition,
        next: Vec<ResourceKey>,
    ) -> Result<bool, GraphError> {
        let edge = self.to_many_mut(key, &definition.key, "replace-relationship")?;
        let wanted: FxHashSet<&Lid> = next.iter().map(ResourceKey::lid).collect();
        let removals: Vec<ResourceKey> = edge
            .members()
            .data()
            .iter()
            .filter(|member| !wanted.contains(member.lid()))
            .cloned()
            .collect();
        let additions: Vec<ResourceKey> = next
            .iter()
            .filter(|member| !edge.members().has(member))
            .cloned()
            .collect();
        for member in &removals {
            edge.members_mut().remove(member)?;
        }
        for member in &additions {
            edge.members_mut().add(member.clone())?;
        }
        let reordered = edge.members_mut().reorder_additions(&next);

        for member in &removals {
            self.remove_from_inverse(key, definition, member, false)?;
        }
        for member in &additions {
            self.add_to_inverse(key, definition, member, false)?;
        }
        Ok(!removals.is_empty() || !additions.is_empty() || reordered)
    }

    /// Replaces a to-one value. Returns `true` when the owning edge should be
    /// notified.
    ///
    /// Remote: the remote value is replaced. The local value follows it only
    /// when it was not diverging (or under `clear_local_on_remote_update`); a
    /// pending local value otherwise survives, including a local value set
    /// while the server reports `null`.
    pub(crate) fn replace_resource(
        &mut self,
        key: &ResourceKey,
        definition: &ResolvedDefinition,
        next: Option<ResourceKey>,
        remote: bool,
    ) -> Result<bool, GraphError> {
        debug_assert_eq!(definition.kind, RelationshipKind::ToOne);
        if remote {
            self.replace_resource_remote(key, definition, next)
        } else {
            self.replace_resource_local(key, definition, next)
        }
    }

    fn replace_resource_remote(
        &mut self,
        key: &ResourceKey,
        definition: &ResolvedDefinition,
        next: Option<ResourceKey>,
    ) -> Result<bool, GraphError> {
        let clear_local = self.config().clear_local_on_remote_update;
        let edge = self.to_one_mut(key, &definition.key, "replace-related-resource")?;
        let was_received = edge.header.state.has_received_data;
        edge.header.state.has_received_data = true;
        edge.header.state.is_empty = next.is_none();
        if edge.remote() == next.as_ref() {
            return Ok(!was_received);
        }
        let previous = edge.set_remote(next.clone());
        let diverged = edge.local() != previous.as_ref();
        let mut changed = !was_received;
        let mut discarded = None;
        if !diverged || clear_local {
            let old_local = edge.set_local(next.clone());
            changed |= old_local != next;
            if diverged {
                discarded = old_local;
            }
        }

        if let Some(previous) = &previous {
            self.remove_from_inverse(key, definition, previous, true)?;
        }
        if let Some(discarded) = discarded.filter(|old| Some(old) != next.as_ref()) {
            self.remove_from_inverse(key, definition, &discarded, false)?;
        }
        if let Some(next) = &next {
            self.add_to_inverse(key, definition, next, true)?;
        }
        Ok(changed)
    }

    fn replace_resource_local(
        &mut self,
        key: &ResourceKey,
        definition: &ResolvedDefinition,
        next: Option<ResourceKey>,
    ) -> Result<bool, GraphError> {
        let edge = self.to_one_mut(key, &definition.key, "replace-related-resource")?;
        if edge.local() == next.as_ref() {
            return Ok(false);
        }
        let previous = edge.set_local(next.clone());
        if let Some(previous) = &previous {
            self.remove_from_inverse(key, definition, previous, false)?;
        }
        if let Some(next) = &next {
            self.add_to_inverse(key, definition, next, false)?;
        }
        Ok(true)
    }
}
