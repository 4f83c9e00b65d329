// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Integrity enforcement gate.
//!
//! Integrity and caller-contract checks re-verify invariants the core already
//! maintains. They are programmer-error detectors, not runtime conditions.
//!
//! # Cfg Gating
//!
//! Checks are active when `debug_assertions` is set (debug builds) or when the
//! `integrity_release` feature is enabled. The `unchecked_graph` feature
//! disables all of them regardless. With checks disabled the predicates below
//! are never evaluated and the offending operation proceeds as a no-op or
//! best-effort write.
//!
//! Schema errors are not gated: they are always reported.

use rustc_hash::FxHashSet;

use crate::error::{GraphError, IntegrityViolation};
use crate::ident::{Lid, ResourceKey};

#[cfg(all(feature = "integrity_release", feature = "unchecked_graph"))]
compile_error!("features `integrity_release` and `unchecked_graph` are mutually exclusive");

const ENABLED: bool = cfg!(all(
    any(debug_assertions, feature = "integrity_release"),
    not(feature = "unchecked_graph")
));

/// Returns `true` when integrity and contract checks run in this build.
#[inline]
#[must_use]
pub const fn checks_enabled() -> bool {
    ENABLED
}

/// Fails with `violation()` when checks are enabled and `holds()` is false.
///
/// Both closures are skipped entirely when checks are disabled.
#[inline]
pub(crate) fn ensure<E>(
    holds: impl FnOnce() -> bool,
    violation: impl FnOnce() -> E,
) -> Result<(), GraphError>
where
    E: Into<GraphError>,
{
    if ENABLED && !holds() {
        return Err(violation().into());
    }
    Ok(())
}

/// Verifies that `keys` names each lid at most once.
pub(crate) fn ensure_unique(keys: &[ResourceKey]) -> Result<(), GraphError> {
    if !ENABLED {
        return Ok(());
    }
    let mut seen: FxHashSet<&Lid> = FxHashSet::default();
    for key in keys {
        if !seen.insert(key.lid()) {
            return Err(IntegrityViolation::DuplicateMember(key.lid().clone()).into());
        }
    }
    Ok(())
}
