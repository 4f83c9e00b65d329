// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relationship payloads: the JSON:API wire shape and its resolved form.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::GraphError;
use crate::ident::{ResourceKey, ResourceRef};
use crate::registry::IdentityRegistry;

/// `data` member of a relationship object as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadData {
    /// Array linkage (to-many).
    Many(Vec<ResourceRef>),
    /// Single linkage or explicit `null` (to-one).
    One(Option<ResourceRef>),
}

fn present<'de, D>(deserializer: D) -> Result<Option<PayloadData>, D::Error>
where
    D: Deserializer<'de>,
{
    PayloadData::deserialize(deserializer).map(Some)
}

/// Relationship object as found in a fetched document.
///
/// An absent `data` member deserializes to `None`; an explicit `null` to
/// `Some(PayloadData::One(None))`. The distinction matters: absent data on an
/// async relationship means "unknown", `null` means "confirmed empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipPayload {
    /// Resource linkage.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub data: Option<PayloadData>,
    /// Links object, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
    /// Meta object, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl RelationshipPayload {
    /// Resolves every reference through `registry`.
    pub fn resolve<R>(&self, registry: &mut R) -> Result<EdgePayload, GraphError>
    where
        R: IdentityRegistry + ?Sized,
    {
        let data = match &self.data {
            None => None,
            Some(PayloadData::One(None)) => Some(EdgeData::One(None)),
            Some(PayloadData::One(Some(reference))) => {
                Some(EdgeData::One(Some(registry.identity_for(reference)?)))
            }
            Some(PayloadData::Many(references)) => Some(EdgeData::Many(
                references
                    .iter()
                    .map(|reference| registry.identity_for(reference))
                    .collect::<Result<_, _>>()?,
            )),
        };
        Ok(EdgePayload {
            data,
            links: self.links.clone(),
            meta: self.meta.clone(),
        })
    }
}

/// Resolved resource linkage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeData {
    /// Single member (or none).
    One(Option<ResourceKey>),
    /// Ordered members.
    Many(Vec<ResourceKey>),
}

impl EdgeData {
    /// `true` for `null` and `[]`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(value) => value.is_none(),
            Self::Many(values) => values.is_empty(),
        }
    }

    /// Members as a list regardless of shape.
    #[must_use]
    pub fn into_keys(self) -> Vec<ResourceKey> {
        match self {
            Self::One(value) => value.into_iter().collect(),
            Self::Many(values) => values,
        }
    }
}

/// Relationship payload with references resolved to keys; what
/// [`crate::Graph::push`] consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgePayload {
    /// Resource linkage; `None` when the payload carried no `data` member.
    pub data: Option<EdgeData>,
    /// Links object.
    pub links: Option<Value>,
    /// Meta object.
    pub meta: Option<Value>,
}

impl EdgePayload {
    /// Payload carrying only linkage.
    #[must_use]
    pub fn with_data(data: EdgeData) -> Self {
        Self {
            data: Some(data),
            links: None,
            meta: None,
        }
    }

    /// Payload carrying only a links object.
    #[must_use]
    pub fn with_links(links: Value) -> Self {
        Self {
            data: None,
            links: Some(links),
            meta: None,
        }
    }
}

/// `href` of a links object's `related` member, in either the string or the
/// link-object form.
pub(crate) fn related_href(links: &Value) -> Option<&str> {
    match links.get("related")? {
        Value::String(href) => Some(href),
        Value::Object(link) => link.get("href").and_then(Value::as_str),
        _ => None,
    }
}
