// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Incremental additions and removals.
use crate::error::{ContractViolation, GraphError};
use crate::graph::Graph;
use crate::ident::ResourceKey;
use crate::notify::NotificationSink;
use crate::schema::{RelationshipKind, SchemaProvider};

impl<S, N> Graph<S, N>
where
    S: SchemaProvider,
    N: NotificationSink,
{
    /// `add-to-relationship`.
    ///
    /// On a to-one field only the remote form is meaningful, and it is applied
    /// as a replacement.
    pub(crate) fn add_to_related(
        &mut self,
        key: &ResourceKey,
        field: &str,
        value: Vec<ResourceKey>,
        remote: bool,
    ) -> Result<(), GraphError> {
        let definition = self.definition(key.ty(), field)?;
        match definition.kind {
            RelationshipKind::ToOne => {
                if !remote {
                    return Err(ContractViolation::KindMismatch {
                        op: "add-to-relationship",
                        field: field.to_string(),
                        kind: RelationshipKind::ToOne,
                    }
                    .into());
                }
                let Some(next) = self.admit_one(&definition, value)? else {
                    return Ok(());
                };
                if self.replace_resource(key, &definition, Some(next), true)? {
                    self.touched(key, &definition.key);
                }
            }
            RelationshipKind::ToMany => {
                let value = self.admit(key, &definition, value)?;
                for member in &value {
                    let already = !remote
                        && self
                            .edge(key, &definition.key)
                            .is_some_and(|edge| edge.has(member));
                    if already {
                        continue;
                    }
                    self.edge_add(key, &definition.key, member, remote)?;
                    self.add_to_inverse(key, &definition, member, remote)?;
                }
            }
        }
        Ok(())
    }

    /// `remove-from-relationship`.
    ///
    /// On a to-one field only the remote form is meaningful: it clears the
    /// remote value when the removal names it.
    pub(crate) fn remove_from_related(
        &mut self,
        key: &ResourceKey,
        field: &str,
        value: Vec<ResourceKey>,
        remote: bool,
    ) -> Result<(), GraphError> {
        let definition = self.definition(key.ty(), field)?;
        match definition.kind {
            RelationshipKind::ToOne => {
                if !remote {
                    return Err(ContractViolation::KindMismatch {
                        op: "remove-from-relationship",
                        field: field.to_string(),
                        kind: RelationshipKind::ToOne,
                    }
                    .into());
                }
                let current = self.to_one_mut(key, field, "remove-from-relationship")?.remote().cloned();
                if current.is_some_and(|current| value.contains(&current))
                    && self.replace_resource(key, &definition, None, true)?
                {
                    self.touched(key, &definition.key);
                }
            }
            RelationshipKind::ToMany => {
                for member in &value {
                    let changed = self.edge_remove(key, &definition.key, member, remote)?;
                    if changed || remote {
                        self.remove_from_inverse(key, &definition, member, remote)?;
                    }
                }
            }
        }
        Ok(())
    }
}
