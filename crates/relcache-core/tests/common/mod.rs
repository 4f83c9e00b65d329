// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use relcache_core::{Graph, GraphConfig, ResourceKey, StaticSchema};
use relcache_dry_tests::{init_tracing, RecordingSink};

/// Graph type every integration test drives.
pub type TestGraph = Graph<StaticSchema, RecordingSink>;

/// Fresh graph over `schema` with the default configuration.
pub fn graph(schema: StaticSchema) -> TestGraph {
    graph_with(schema, GraphConfig::default())
}

/// Fresh graph over `schema` with `config`.
pub fn graph_with(schema: StaticSchema, config: GraphConfig) -> TestGraph {
    init_tracing();
    Graph::with_config(schema, RecordingSink::new(), config)
}

/// Effective members of `key.field` as a list.
pub fn members(graph: &mut TestGraph, key: &ResourceKey, field: &str) -> Vec<ResourceKey> {
    graph
        .data(key, field)
        .map(relcache_core::EdgeData::into_keys)
        .unwrap_or_default()
}

/// Drains notifications recorded so far as `"type:id.field"` labels.
pub fn notified(graph: &mut TestGraph) -> Vec<String> {
    graph.sink_mut().take()
}

/// Drains notifications and sorts them, for assertions that do not care
/// about flush order.
pub fn notified_sorted(graph: &mut TestGraph) -> Vec<String> {
    let mut labels = notified(graph);
    labels.sort();
    labels
}
