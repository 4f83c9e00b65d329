// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::tracked::TrackedMembership;

use super::EdgeHeader;

/// To-many relationship backed by a [`TrackedMembership`].
#[derive(Debug, Clone)]
pub struct ToManyEdge {
    pub(crate) header: EdgeHeader,
    members: TrackedMembership,
}

impl ToManyEdge {
    pub(super) fn new(header: EdgeHeader) -> Self {
        Self {
            header,
            members: TrackedMembership::new(),
        }
    }

    /// Remote state and overlay.
    #[must_use]
    pub fn members(&self) -> &TrackedMembership {
        &self.members
    }

    pub(crate) fn members_mut(&mut self) -> &mut TrackedMembership {
        &mut self.members
    }
}
