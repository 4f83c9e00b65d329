// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Change notification port and the per-settle coalescing queue.
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::ident::{Lid, ResourceKey};
use crate::telemetry;

/// Receiver of "this relationship changed" signals (the reactivity layer).
///
/// Called at most once per `(resource, field)` per settle.
pub trait NotificationSink {
    /// `key.field` changed.
    fn notify_state_change(&mut self, key: &ResourceKey, field: &str);
}

impl<T: NotificationSink + ?Sized> NotificationSink for &mut T {
    fn notify_state_change(&mut self, key: &ResourceKey, field: &str) {
        (**self).notify_state_change(key, field);
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for Box<T> {
    fn notify_state_change(&mut self, key: &ResourceKey, field: &str) {
        (**self).notify_state_change(key, field);
    }
}

/// Sink that drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify_state_change(&mut self, _key: &ResourceKey, _field: &str) {}
}

/// Dirty set for the current settle, in first-touched order.
#[derive(Debug, Default)]
pub(crate) struct NotificationQueue {
    order: Vec<(ResourceKey, Arc<str>)>,
    queued: FxHashSet<(Lid, Arc<str>)>,
}

impl NotificationQueue {
    pub(crate) fn enqueue(&mut self, key: &ResourceKey, field: &Arc<str>) {
        if self.queued.insert((key.lid().clone(), Arc::clone(field))) {
            self.order.push((key.clone(), Arc::clone(field)));
        }
    }

    /// Replaces queued entries for `old` with `new` (identity merge).
    pub(crate) fn relabel(&mut self, old: &ResourceKey, new: &ResourceKey) {
        if !self.order.iter().any(|(key, _)| key == old) {
            return;
        }
        let pending = std::mem::take(&mut self.order);
        self.queued.clear();
        for (key, field) in pending {
            let key = if key == *old { new.clone() } else { key };
            self.enqueue(&key, &field);
        }
    }

    /// Drops queued entries for `key` (resource unloaded).
    pub(crate) fn forget(&mut self, key: &ResourceKey) {
        self.order.retain(|(queued, _)| queued != key);
        self.queued.retain(|(lid, _)| lid != key.lid());
    }

    pub(crate) fn flush<N: NotificationSink + ?Sized>(&mut self, sink: &mut N) {
        let count = self.order.len();
        for (key, field) in self.order.drain(..) {
            telemetry::edge_notified(&key, &field);
            sink.notify_state_change(&key, &field);
        }
        self.queued.clear();
        telemetry::settle_flushed(count);
    }
}
