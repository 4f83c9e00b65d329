// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relationship declarations and the schema provider port.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Cardinality of a relationship field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    /// At most one related resource.
    ToOne,
    /// An ordered collection of related resources.
    ToMany,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToOne => f.write_str("to-one"),
            Self::ToMany => f.write_str("to-many"),
        }
    }
}

/// How a field names its inverse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InverseSpec {
    /// Not declared; infer from the target type's fields.
    Infer,
    /// Explicitly declared as having no inverse.
    None,
    /// Explicitly names the inverse field on the target type.
    Key(Arc<str>),
}

/// Static declaration of one relationship field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDefinition {
    /// Field name.
    pub key: Arc<str>,
    /// Cardinality.
    pub kind: RelationshipKind,
    /// Target type (the base type for polymorphic relationships).
    pub target_type: Arc<str>,
    /// Inverse declaration.
    pub inverse: InverseSpec,
    /// Whether members may be loaded lazily through links.
    pub is_async: bool,
    /// Whether subtypes of `target_type` are accepted.
    pub is_polymorphic: bool,
}

impl RelationshipDefinition {
    fn new(kind: RelationshipKind, key: &str, target_type: &str) -> Self {
        Self {
            key: Arc::from(key),
            kind,
            target_type: Arc::from(target_type),
            inverse: InverseSpec::Infer,
            is_async: false,
            is_polymorphic: false,
        }
    }

    /// Declares a to-one field.
    pub fn to_one(key: &str, target_type: &str) -> Self {
        Self::new(RelationshipKind::ToOne, key, target_type)
    }

    /// Declares a to-many field.
    pub fn to_many(key: &str, target_type: &str) -> Self {
        Self::new(RelationshipKind::ToMany, key, target_type)
    }

    /// Names the inverse field.
    pub fn inverse(mut self, key: &str) -> Self {
        self.inverse = InverseSpec::Key(Arc::from(key));
        self
    }

    /// Declares that there is no inverse.
    pub fn no_inverse(mut self) -> Self {
        self.inverse = InverseSpec::None;
        self
    }

    /// Marks the field async.
    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// Marks the field polymorphic.
    pub fn polymorphic(mut self) -> Self {
        self.is_polymorphic = true;
        self
    }
}

/// Relationship fields of one type, by field name.
pub type DefinitionMap = BTreeMap<Arc<str>, RelationshipDefinition>;

/// Source of relationship declarations.
///
/// Implementations only need [`relationship_definitions_for`]; inverse
/// lookup and inference have default implementations in terms of it.
///
/// [`relationship_definitions_for`]: SchemaProvider::relationship_definitions_for
pub trait SchemaProvider {
    /// All relationship fields of `ty`, including inherited ones.
    fn relationship_definitions_for(&self, ty: &str) -> Option<&DefinitionMap>;

    /// Whether `candidate` is a declared subtype of `base`.
    fn is_subtype_of(&self, _candidate: &str, _base: &str) -> bool {
        false
    }

    /// Whether a resource of type `ty` satisfies a declaration targeting
    /// `declared`.
    fn type_matches(&self, ty: &str, declared: &str) -> bool {
        ty == declared || self.is_subtype_of(ty, declared)
    }

    /// Resolves the inverse of `origin_type.definition` on `target_type`.
    ///
    /// Returns `Ok(None)` when the relationship has no inverse.
    ///
    /// # Errors
    /// - [`SchemaError::MissingInverse`] when a declared inverse is absent.
    /// - [`SchemaError::InverseMismatch`] when the two sides disagree, including
    ///   an explicit `no_inverse` that the other side still claims.
    /// - [`SchemaError::AmbiguousInverse`] when inference finds several fields.
    fn inverse_definition_for(
        &self,
        origin_type: &str,
        definition: &RelationshipDefinition,
        target_type: &str,
    ) -> Result<Option<RelationshipDefinition>, SchemaError> {
        let field = &*definition.key;
        let mismatch = |inverse: &str, detail: &'static str| SchemaError::InverseMismatch {
            ty: origin_type.to_string(),
            field: field.to_string(),
            target: target_type.to_string(),
            inverse: inverse.to_string(),
            detail,
        };
        let target_fields = self.relationship_definitions_for(target_type);

        match &definition.inverse {
            InverseSpec::Key(inverse_key) => {
                let Some(inverse) = target_fields.and_then(|m| m.get(inverse_key)) else {
                    return Err(SchemaError::MissingInverse {
                        ty: origin_type.to_string(),
                        field: field.to_string(),
                        target: target_type.to_string(),
                        inverse: inverse_key.to_string(),
                    });
                };
                match &inverse.inverse {
                    InverseSpec::None => {
                        return Err(mismatch(&**inverse_key, "inverse side declares no inverse"));
                    }
                    InverseSpec::Key(back) if **back != *field => {
                        return Err(mismatch(&**inverse_key, "inverse side names a different field"));
                    }
                    _ => {}
                }
                if !self.type_matches(origin_type, &inverse.target_type) {
                    return Err(mismatch(&**inverse_key, "inverse side targets a different type"));
                }
                Ok(Some(inverse.clone()))
            }
            InverseSpec::None => {
                let claimant = target_fields.and_then(|m| {
                    m.values().find(|d| {
                        matches!(&d.inverse, InverseSpec::Key(back) if **back == *field)
                            && self.type_matches(origin_type, &d.target_type)
                    })
                });
                match claimant {
                    Some(claimant) => Err(mismatch(
                        &*claimant.key,
                        "declared without inverse but the other side names it as its inverse",
                    )),
                    None => Ok(None),
                }
            }
            InverseSpec::Infer => {
                let Some(target_fields) = target_fields else {
                    return Ok(None);
                };
                let candidates: Vec<&RelationshipDefinition> = target_fields
                    .values()
                    .filter(|d| self.type_matches(origin_type, &d.target_type))
                    .filter(|d| match &d.inverse {
                        InverseSpec::Infer => true,
                        InverseSpec::Key(back) => **back == *field,
                        InverseSpec::None => false,
                    })
                    .collect();
                match candidates.as_slice() {
                    [] => Ok(None),
                    [only] => Ok(Some((*only).clone())),
                    many => Err(SchemaError::AmbiguousInverse {
                        ty: origin_type.to_string(),
                        field: field.to_string(),
                        target: target_type.to_string(),
                        candidates: many.iter().map(|d| d.key.to_string()).collect(),
                    }),
                }
            }
        }
    }
}

/// In-memory schema assembled from explicit declarations.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    types: FxHashMap<String, DefinitionMap>,
    supertypes: FxHashMap<String, String>,
}

impl StaticSchema {
    /// Starts a builder.
    pub fn builder() -> StaticSchemaBuilder {
        StaticSchemaBuilder::default()
    }
}

impl SchemaProvider for StaticSchema {
    fn relationship_definitions_for(&self, ty: &str) -> Option<&DefinitionMap> {
        self.types.get(ty)
    }

    fn is_subtype_of(&self, candidate: &str, base: &str) -> bool {
        // A chain longer than the number of declarations has looped.
        let mut current = candidate;
        for _ in 0..self.supertypes.len() {
            let Some(parent) = self.supertypes.get(current) else {
                return false;
            };
            if parent == base {
                return true;
            }
            current = parent;
        }
        false
    }
}

/// Builder for [`StaticSchema`].
#[derive(Debug, Default)]
pub struct StaticSchemaBuilder {
    types: FxHashMap<String, DefinitionMap>,
    supertypes: FxHashMap<String, String>,
}

impl StaticSchemaBuilder {
    /// Declares `definition` on `ty`, replacing any field of the same name.
    pub fn relationship(mut self, ty: &str, definition: RelationshipDefinition) -> Self {
        self.types
            .entry(ty.to_string())
            .or_default()
            .insert(Arc::clone(&definition.key), definition);
        self
    }

    /// Declares a type with no relationship fields.
    pub fn resource(mut self, ty: &str) -> Self {
        self.types.entry(ty.to_string()).or_default();
        self
    }

    /// Declares `subtype` as a subtype of `base`. The subtype inherits every
    /// field of `base` it does not declare itself.
    pub fn subtype(mut self, base: &str, subtype: &str) -> Self {
        self.supertypes.insert(subtype.to_string(), base.to_string());
        self
    }

    /// Finalizes the schema, resolving inherited fields.
    pub fn build(mut self) -> StaticSchema {
        let mut order: Vec<(String, Vec<String>)> = Vec::new();
        for sub in self.supertypes.keys() {
            let mut chain = Vec::new();
            let mut current = sub.as_str();
            while let Some(parent) = self.supertypes.get(current) {
                if chain.contains(parent) {
                    break;
                }
                chain.push(parent.clone());
                current = parent;
            }
            order.push((sub.clone(), chain));
        }
        for (sub, chain) in order {
            let mut merged = self.types.get(&sub).cloned().unwrap_or_default();
            for ancestor in &chain {
                if let Some(fields) = self.types.get(ancestor) {
                    for (name, def) in fields {
                        merged.entry(Arc::clone(name)).or_insert_with(|| def.clone());
                    }
                }
            }
            self.types.insert(sub, merged);
        }
        StaticSchema {
            types: self.types,
            supertypes: self.supertypes,
        }
    }
}
