// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! relcache-core: normalized relationship graph for client-side resource caches.
//!
//! Every relationship of every cached resource is an [`Edge`] owned by a
//! [`Graph`]. Edges keep server-confirmed ("remote") membership apart from
//! uncommitted local changes, diff incoming remote state in linear time, and
//! mirror every change onto the relationship's inverse. Observers are
//! notified once per changed edge per settle.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod config;
mod definition;
/// Relationship edges and their read views.
pub mod edge;
mod error;
mod graph;
mod ident;
/// Integrity check gating.
pub mod integrity;
mod membership;
mod notify;
mod ops;
mod payload;
mod registry;
mod schema;
mod telemetry;
mod tracked;

// Re-exports for stable public API
/// Graph behavior configuration.
pub use config::{DuplicatePolicy, GraphConfig};
/// Relationship definitions with both sides resolved.
pub use definition::{InverseSide, ResolvedDefinition};
/// Edge types.
pub use edge::{Edge, EdgeHeader, EdgeState, RelationshipView, ToManyEdge, ToOneEdge};
/// Error taxonomy.
pub use error::{ContractViolation, GraphError, IdentityError, IntegrityViolation, SchemaError};
/// The relationship graph.
pub use graph::Graph;
/// Identity types.
pub use ident::{Lid, ResourceKey, ResourceRef};
/// Membership primitives.
pub use membership::{MembershipDiff, MembershipSet};
/// Notification port.
pub use notify::{NotificationSink, NullSink};
/// Graph operations.
pub use ops::Operation;
/// Relationship payloads, wire and resolved.
pub use payload::{EdgeData, EdgePayload, PayloadData, RelationshipPayload};
/// Identity registry port and implementation.
pub use registry::{IdentityRegistry, KeyRegistry, MergeOutcome};
/// Schema declarations and the schema provider port.
pub use schema::{
    DefinitionMap, InverseSpec, RelationshipDefinition, RelationshipKind, SchemaProvider,
    StaticSchema, StaticSchemaBuilder,
};
/// Remote membership with a local overlay.
pub use tracked::{MembershipChanges, RemoteUpdate, TrackedMembership};
