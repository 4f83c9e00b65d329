// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolved relationship definitions (both sides of an edge).
use std::sync::Arc;

use crate::error::SchemaError;
use crate::schema::{RelationshipKind, SchemaProvider};

/// The inverse side of a resolved relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InverseSide {
    /// Inverse field name on the target type.
    pub key: Arc<str>,
    /// Cardinality of the inverse field.
    pub kind: RelationshipKind,
    /// Whether the inverse field is async.
    pub is_async: bool,
}

/// A relationship definition with its inverse resolved.
///
/// Resolved once per `(origin type, field)` and shared by every edge of that
/// field through an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDefinition {
    /// Type declaring the field.
    pub origin_type: Arc<str>,
    /// Field name.
    pub key: Arc<str>,
    /// Cardinality.
    pub kind: RelationshipKind,
    /// Declared target type.
    pub target_type: Arc<str>,
    /// Whether the field loads lazily.
    pub is_async: bool,
    /// Whether subtypes of `target_type` are accepted.
    pub is_polymorphic: bool,
    /// Inverse side, or `None` when the relationship has no inverse.
    pub inverse: Option<InverseSide>,
}

impl ResolvedDefinition {
    /// `true` when the field points back at its own type.
    #[must_use]
    pub fn is_self_referential(&self) -> bool {
        self.origin_type == self.target_type
    }

    /// `true` when the field is its own inverse (e.g. `person.spouse`).
    #[must_use]
    pub fn is_reflexive(&self) -> bool {
        self.is_self_referential()
            && self
                .inverse
                .as_ref()
                .is_some_and(|inverse| inverse.key == self.key)
    }

    /// Inverse field name, if any.
    #[must_use]
    pub fn inverse_key(&self) -> Option<&Arc<str>> {
        self.inverse.as_ref().map(|inverse| &inverse.key)
    }
}

/// Resolves `ty.field` against `schema`.
///
/// The inverse is looked up on the declared target type. Polymorphic members
/// of a subtype resolve their own side through that subtype's (inherited)
/// declarations when their edge is first touched.
pub(crate) fn resolve<S>(schema: &S, ty: &str, field: &str) -> Result<ResolvedDefinition, SchemaError>
where
    S: SchemaProvider + ?Sized,
{
    let definition = schema
        .relationship_definitions_for(ty)
        .and_then(|fields| fields.get(field))
        .ok_or_else(|| SchemaError::UnknownRelationship {
            ty: ty.to_string(),
            field: field.to_string(),
        })?;
    let inverse = schema
        .inverse_definition_for(ty, definition, &definition.target_type)?
        .map(|inverse| InverseSide {
            key: inverse.key,
            kind: inverse.kind,
            is_async: inverse.is_async,
        });
    Ok(ResolvedDefinition {
        origin_type: Arc::from(ty),
        key: Arc::clone(&definition.key),
        kind: definition.kind,
        target_type: Arc::clone(&definition.target_type),
        is_async: definition.is_async,
        is_polymorphic: definition.is_polymorphic,
        inverse,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::{RelationshipDefinition, StaticSchema};

    #[test]
    fn reflexive_fields_are_detected() {
        let schema = StaticSchema::builder()
            .relationship("person", RelationshipDefinition::to_one("spouse", "person").inverse("spouse"))
            .relationship("person", RelationshipDefinition::to_many("friends", "person").no_inverse())
            .build();
        let spouse = resolve(&schema, "person", "spouse").unwrap();
        assert!(spouse.is_self_referential());
        assert!(spouse.is_reflexive());
        let friends = resolve(&schema, "person", "friends").unwrap();
        assert!(friends.is_self_referential());
        assert!(!friends.is_reflexive());
        assert_eq!(friends.inverse_key(), None);
    }

    #[test]
    fn unknown_fields_are_schema_errors() {
        let schema = StaticSchema::builder().resource("person").build();
        assert_eq!(
            resolve(&schema, "person", "pets"),
            Err(SchemaError::UnknownRelationship {
                ty: "person".into(),
                field: "pets".into(),
            })
        );
    }
}
