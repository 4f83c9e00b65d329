// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for relcache crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`keys`] - Key minting and payload helpers
//! - [`logging`] - Test tracing subscriber
//! - [`schema`] - Schema fixtures (blog, reflexive, polymorphic, async)
//! - [`sink`] - Recording notification sink

pub mod config;
pub mod keys;
pub mod logging;
pub mod schema;
pub mod sink;

// Re-export commonly used items at crate root for convenience
pub use config::InMemoryConfigStore;
pub use keys::{many, none, one, KeyFactory};
pub use logging::init_tracing;
pub use schema::{blog_schema, canvas_schema, library_schema, people_schema};
pub use sink::RecordingSink;
