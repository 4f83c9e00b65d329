// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Test tracing subscriber.

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly `fmt` subscriber filtered by `RUST_LOG`
/// (default `warn`). Safe to call from every test; only the first call wins.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
