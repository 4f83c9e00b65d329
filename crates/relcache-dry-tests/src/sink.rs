// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording notification sink.

use relcache_core::{NotificationSink, ResourceKey};

/// [`NotificationSink`] that records every notification in arrival order.
///
/// Read it back through `Graph::sink` / `Graph::sink_mut`.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<(ResourceKey, String)>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded since the last [`take`](Self::take).
    pub fn events(&self) -> &[(ResourceKey, String)] {
        &self.events
    }

    /// Number of recorded notifications.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// How many times `key.field` was notified.
    pub fn count_for(&self, key: &ResourceKey, field: &str) -> usize {
        self.events
            .iter()
            .filter(|(k, f)| k == key && f == field)
            .count()
    }

    /// Drains the recorded notifications as `"type:id.field"` labels.
    pub fn take(&mut self) -> Vec<String> {
        self.events
            .drain(..)
            .map(|(key, field)| format!("{key}.{field}"))
            .collect()
    }

    /// Drops everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl NotificationSink for RecordingSink {
    fn notify_state_change(&mut self, key: &ResourceKey, field: &str) {
        self.events.push((key.clone(), field.to_string()));
    }
}
