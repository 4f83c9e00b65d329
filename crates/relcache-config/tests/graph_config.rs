// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Config service behavior against the in-memory store fake.

use relcache_config::{
    load_graph_config, save_graph_config, ConfigError, ConfigService, ConfigStore,
    GRAPH_CONFIG_KEY,
};
use relcache_core::{DuplicatePolicy, GraphConfig};
use relcache_dry_tests::InMemoryConfigStore;

#[test]
fn missing_graph_config_yields_defaults() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    assert_eq!(load_graph_config(&service).unwrap(), GraphConfig::default());
    assert_eq!(store.load_count(), 1);
}

#[test]
fn saved_graph_config_reloads() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    let config = GraphConfig {
        clear_local_on_remote_update: true,
        duplicate_members: DuplicatePolicy::Reject,
        notify_initial_push: false,
    };
    save_graph_config(&service, &config).unwrap();
    assert!(store.contains_key(GRAPH_CONFIG_KEY));
    assert_eq!(load_graph_config(&service).unwrap(), config);
}

#[test]
fn partial_document_fills_in_defaults() {
    let store = InMemoryConfigStore::new();
    store
        .save_raw(GRAPH_CONFIG_KEY, br#"{"notify_initial_push": true}"#)
        .unwrap();
    let service = ConfigService::new(store);
    let config = load_graph_config(&service).unwrap();
    assert!(config.notify_initial_push);
    assert_eq!(config.duplicate_members, DuplicatePolicy::Dedupe);
}

#[test]
fn store_failures_propagate() {
    let store = InMemoryConfigStore::new();
    store.set_fail_on_load(true);
    let service = ConfigService::new(store);
    assert!(matches!(
        load_graph_config(&service),
        Err(ConfigError::Other(_))
    ));
}

#[test]
fn malformed_document_is_a_serde_error() {
    let store = InMemoryConfigStore::new();
    store.save_raw(GRAPH_CONFIG_KEY, b"{not json").unwrap();
    let service = ConfigService::new(store);
    assert!(matches!(
        load_graph_config(&service),
        Err(ConfigError::Serde(_))
    ));
}

#[test]
fn empty_blob_reads_as_missing() {
    let store = InMemoryConfigStore::new();
    store.save_raw("prefs", b"").unwrap();
    let service = ConfigService::new(store);
    assert!(service.load::<serde_json::Value>("prefs").unwrap().is_none());
}

#[test]
fn save_writes_pretty_json() {
    let service = ConfigService::new(InMemoryConfigStore::new());
    service.save("prefs", &serde_json::json!({"a": 1})).unwrap();
    let raw = service.store().load_raw("prefs").unwrap();
    assert!(String::from_utf8(raw).unwrap().contains('\n'));
}

#[test]
fn save_failure_propagates() {
    let store = InMemoryConfigStore::new();
    store.set_fail_on_save(true);
    let service = ConfigService::new(store.clone());
    assert!(service.save("prefs", &1_u32).is_err());
    assert_eq!(store.save_count(), 1);
    assert!(!store.contains_key("prefs"));
}
