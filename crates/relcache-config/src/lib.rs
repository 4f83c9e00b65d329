// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service, storage port, and filesystem store for relcache settings.
#![forbid(unsafe_code)]

mod fs;
mod service;

pub use fs::FsConfigStore;
pub use service::{ConfigError, ConfigService, ConfigStore};

use relcache_core::GraphConfig;

/// Store key under which [`GraphConfig`] is persisted.
pub const GRAPH_CONFIG_KEY: &str = "graph";

/// Loads the persisted [`GraphConfig`], falling back to defaults when none
/// has been saved.
pub fn load_graph_config<S: ConfigStore>(
    service: &ConfigService<S>,
) -> Result<GraphConfig, ConfigError> {
    let loaded = service.load::<GraphConfig>(GRAPH_CONFIG_KEY)?;
    if loaded.is_none() {
        tracing::debug!(key = GRAPH_CONFIG_KEY, "no stored graph config; using defaults");
    }
    Ok(loaded.unwrap_or_default())
}

/// Persists `config` under [`GRAPH_CONFIG_KEY`].
pub fn save_graph_config<S: ConfigStore>(
    service: &ConfigService<S>,
    config: &GraphConfig,
) -> Result<(), ConfigError> {
    service.save(GRAPH_CONFIG_KEY, config)
}
