// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Operation dispatch.
//!
//! Every operation applies to the named edge first and then mirrors the change
//! onto the inverse edge of each affected member. Mirroring never recurses:
//! the inverse side is updated through single-edge primitives that do not
//! propagate further.
use tracing::instrument;

use crate::error::GraphError;
use crate::graph::Graph;
use crate::ident::ResourceKey;
use crate::notify::NotificationSink;
use crate::registry::MergeOutcome;
use crate::schema::SchemaProvider;

mod inverse;
mod merge;
mod push;
mod related;
mod replace;
mod rollback;
mod unload;

/// A mutation addressed to the graph.
///
/// Applied with [`Graph::update`]; the `remote` flag passed alongside decides
/// whether it changes server-confirmed state or the local overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Add members to a to-many field. Remote adds on a to-one field replace
    /// its value.
    AddToRelatedRecords {
        /// Owning resource.
        key: ResourceKey,
        /// Field name.
        field: String,
        /// Members to add.
        value: Vec<ResourceKey>,
    },
    /// Remove members from a to-many field. Remote removals on a to-one field
    /// clear it when they name its current value.
    RemoveFromRelatedRecords {
        /// Owning resource.
        key: ResourceKey,
        /// Field name.
        field: String,
        /// Members to remove.
        value: Vec<ResourceKey>,
    },
    /// Replace the whole membership of a to-many field.
    ReplaceRelatedRecords {
        /// Owning resource.
        key: ResourceKey,
        /// Field name.
        field: String,
        /// New membership.
        value: Vec<ResourceKey>,
    },
    /// Replace the value of a to-one field.
    ReplaceRelatedRecord {
        /// Owning resource.
        key: ResourceKey,
        /// Field name.
        field: String,
        /// New value.
        value: Option<ResourceKey>,
    },
    /// Fold a provisional identity into the identity that survived a merge.
    MergeIdentifiers(MergeOutcome),
    /// The resource was deleted; detach it from every partner.
    DeleteRecord {
        /// Deleted resource.
        key: ResourceKey,
    },
}

impl<S, N> Graph<S, N>
where
    S: SchemaProvider,
    N: NotificationSink,
{
    /// Applies `op` as one settle.
    #[instrument(skip_all, fields(remote = remote))]
    pub fn update(&mut self, op: Operation, remote: bool) -> Result<(), GraphError> {
        self.batch(|graph| match op {
            Operation::AddToRelatedRecords { key, field, value } => {
                graph.add_to_related(&key, &field, value, remote)
            }
            Operation::RemoveFromRelatedRecords { key, field, value } => {
                graph.remove_from_related(&key, &field, value, remote)
            }
            Operation::ReplaceRelatedRecords { key, field, value } => {
                graph.replace_related_records(&key, &field, value, remote)
            }
            Operation::ReplaceRelatedRecord { key, field, value } => {
                graph.replace_related_record(&key, &field, value, remote)
            }
            Operation::MergeIdentifiers(outcome) => {
                graph.merge_identifier(&outcome.kept, &outcome.abandoned)
            }
            Operation::DeleteRecord { key } => graph.remove_from_partners(&key),
        })
    }

    /// Folds `outcome.abandoned` into `outcome.kept` everywhere.
    pub fn merge_identifiers(&mut self, outcome: &MergeOutcome) -> Result<(), GraphError> {
        self.batch(|graph| graph.merge_identifier(&outcome.kept, &outcome.abandoned))
    }

    /// Detaches a deleted resource from every partner edge and empties its
    /// own edges. The edges stay materialized until [`Graph::unload`].
    #[instrument(skip_all, fields(ty = %key.ty(), lid = %key.lid()))]
    pub fn commit_deletion(&mut self, key: &ResourceKey) -> Result<(), GraphError> {
        self.batch(|graph| graph.remove_from_partners(key))
    }
}
