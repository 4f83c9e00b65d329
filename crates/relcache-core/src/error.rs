// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for graph operations.
//!
//! Every public operation returns [`GraphError`]. The core never catches or
//! retries; a failure part-way through inverse propagation leaves the graph in
//! whatever state the completed steps produced.
use thiserror::Error;

use crate::ident::Lid;
use crate::schema::RelationshipKind;

/// Identity registry and key construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// A key was built with an empty resource type.
    #[error("resource type must not be empty")]
    EmptyType,
    /// A lid was built from an empty token.
    #[error("lid must not be empty")]
    EmptyLid,
    /// A server id was assigned to a key that already carries a different one.
    #[error("resource {lid} already has id {current:?}; refusing to assign {requested:?}")]
    IdReassigned {
        /// Identity being updated.
        lid: Lid,
        /// Id already assigned.
        current: String,
        /// Id the caller tried to assign.
        requested: String,
    },
    /// A reference named a lid the registry has never issued.
    #[error("unknown lid: {0}")]
    UnknownLid(Lid),
    /// A reference carried neither an id nor a lid.
    #[error("reference to type {0:?} has neither id nor lid")]
    Unidentifiable(String),
}

/// Schema declaration problems, surfaced at the point of mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The type declares no relationship with this name.
    #[error("{ty} has no relationship named {field:?}")]
    UnknownRelationship {
        /// Origin type.
        ty: String,
        /// Requested field.
        field: String,
    },
    /// The declared inverse field does not exist on the target type.
    #[error("{ty}.{field} declares inverse {target}.{inverse}, which does not exist")]
    MissingInverse {
        /// Origin type.
        ty: String,
        /// Origin field.
        field: String,
        /// Target type.
        target: String,
        /// Declared inverse field.
        inverse: String,
    },
    /// The two sides of a relationship disagree about each other.
    #[error("{ty}.{field} and {target}.{inverse} disagree: {detail}")]
    InverseMismatch {
        /// Origin type.
        ty: String,
        /// Origin field.
        field: String,
        /// Target type.
        target: String,
        /// Field on the target type involved in the disagreement.
        inverse: String,
        /// What disagrees.
        detail: &'static str,
    },
    /// Inverse inference found more than one candidate field.
    #[error("{ty}.{field}: inverse on {target} is ambiguous between {candidates:?}")]
    AmbiguousInverse {
        /// Origin type.
        ty: String,
        /// Origin field.
        field: String,
        /// Target type.
        target: String,
        /// Candidate inverse fields.
        candidates: Vec<String>,
    },
    /// A non-polymorphic relationship received a member of the wrong type.
    #[error("{ty}.{field} expects {expected} but received {found}")]
    InvalidRelatedType {
        /// Origin type.
        ty: String,
        /// Origin field.
        field: String,
        /// Declared target type.
        expected: String,
        /// Type of the offending member.
        found: String,
    },
    /// A polymorphic relationship received a type the schema does not accept.
    #[error("{ty}.{field} is polymorphic over {base} but {found} is not an accepted subtype")]
    InvalidPolymorphicType {
        /// Origin type.
        ty: String,
        /// Origin field.
        field: String,
        /// Declared base type.
        base: String,
        /// Type of the offending member.
        found: String,
    },
}

/// Broken internal invariant. Only produced while integrity checks are
/// enabled (see [`crate::integrity`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    /// A value is pending both addition and removal on the same edge.
    #[error("{0} is pending both addition and removal")]
    OverlayOverlap(Lid),
    /// The effective view lists the same member twice.
    #[error("effective view contains {0} more than once")]
    DuplicateMember(Lid),
    /// Membership lookup and ordered storage disagree.
    #[error("membership index and ordered storage disagree about {0}")]
    IndexDesync(Lid),
    /// A partner edge does not mirror a membership it should mirror.
    #[error("inverse of {owner}.{field} does not mirror {member}")]
    AsymmetricInverse {
        /// Owning resource of the edge that was checked.
        owner: Lid,
        /// Field that was checked.
        field: String,
        /// Member whose inverse is missing.
        member: Lid,
    },
}

/// Misuse of an operation by its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// The value is already a member (or already pending addition).
    #[error("{0} is already a member")]
    AlreadyMember(Lid),
    /// The value is not a member (or already pending removal).
    #[error("{0} is not a member")]
    NotAMember(Lid),
    /// An incoming list named the same resource twice.
    #[error("incoming membership lists {0} more than once")]
    DuplicateIncoming(Lid),
    /// A to-one relationship was given more than one member.
    #[error("{field:?} is to-one but received {count} members")]
    Cardinality {
        /// Field being updated.
        field: String,
        /// Number of members supplied.
        count: usize,
    },
    /// The operation does not apply to this relationship kind.
    #[error("{op} cannot be applied to {kind} relationship {field:?}")]
    KindMismatch {
        /// Operation name.
        op: &'static str,
        /// Field being updated.
        field: String,
        /// Actual kind of the relationship.
        kind: RelationshipKind,
    },
}

/// Aggregate error returned by every graph operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Identity failure.
    #[error(transparent)]
    Identity(#[from] IdentityError),
    /// Schema declaration failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Internal invariant broken.
    #[error(transparent)]
    Integrity(#[from] IntegrityViolation),
    /// Caller misuse.
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}
