// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Remote ingestion of relationship payloads.
use tracing::instrument;

use crate::error::GraphError;
use crate::graph::Graph;
use crate::ident::ResourceKey;
use crate::notify::NotificationSink;
use crate::payload::{related_href, EdgeData, EdgePayload};
use crate::schema::{RelationshipKind, SchemaProvider};

impl<S, N> Graph<S, N>
where
    S: SchemaProvider,
    N: NotificationSink,
{
    /// Ingests a relationship payload received from the server.
    ///
    /// - `data` replaces the remote membership. A sync relationship that has
    ///   never received data treats a missing `data` as "no members".
    /// - `links` are stored; a changed `related` link without `data` marks the
    ///   edge stale.
    /// - `meta` is stored.
    ///
    /// The owning edge is notified when its data or staleness changed, except
    /// on the `initial` push of a freshly created resource (unless
    /// `notify_initial_push` is set). Partner edges are always notified.
    #[instrument(skip_all, fields(ty = %key.ty(), lid = %key.lid(), field = %field, initial = initial))]
    pub fn push(
        &mut self,
        key: &ResourceKey,
        field: &str,
        payload: EdgePayload,
        initial: bool,
    ) -> Result<(), GraphError> {
        self.batch(|graph| graph.apply_push(key, field, payload, initial))
    }

    fn apply_push(
        &mut self,
        key: &ResourceKey,
        field: &str,
        payload: EdgePayload,
        initial: bool,
    ) -> Result<(), GraphError> {
        let definition = self.definition(key.ty(), field)?;
        let EdgePayload { data, links, meta } = payload;

        let header = self.edge_mut(key, field)?.header_mut();
        if meta.is_some() {
            header.meta = meta;
        }
        let mut link_changed = false;
        if let Some(links) = links {
            let previous = header.links.as_ref().and_then(related_href);
            link_changed = related_href(&links).is_some_and(|href| Some(href) != previous);
            header.links = Some(links);
        }
        header.state.has_failed_load_attempt = false;
        let had_data = header.state.has_received_data;

        let data = data.or_else(|| {
            (!definition.is_async && !had_data).then(|| match definition.kind {
                RelationshipKind::ToOne => EdgeData::One(None),
                RelationshipKind::ToMany => EdgeData::Many(Vec::new()),
            })
        });

        let changed = match data {
            Some(data) => {
                let changed = match definition.kind {
                    RelationshipKind::ToMany => {
                        let keys = self.admit(key, &definition, data.into_keys())?;
                        self.replace_records(key, &definition, keys, true)?
                    }
                    RelationshipKind::ToOne => {
                        let next = self.admit_one(&definition, data.into_keys())?;
                        self.replace_resource(key, &definition, next, true)?
                    }
                };
                let state = &mut self.edge_mut(key, field)?.header_mut().state;
                state.is_stale = false;
                state.should_force_reload = false;
                changed
            }
            None => {
                let state = &mut self.edge_mut(key, field)?.header_mut().state;
                state.is_stale |= link_changed;
                link_changed
            }
        };

        if changed && (!initial || self.config().notify_initial_push) {
            self.touched(key, &definition.key);
        }
        Ok(())
    }
}
