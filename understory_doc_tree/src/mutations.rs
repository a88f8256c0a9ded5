// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batched mutation records produced by [`Tree::commit`](crate::Tree::commit).

use alloc::vec::Vec;

use crate::types::NodeId;

/// Structural and content changes accumulated since the previous commit.
///
/// Records are appended in the order the operations happened. A node may appear
/// in several lists (for example attached, then removed) within one batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mutations {
    /// Nodes linked under a parent.
    pub attached: Vec<NodeId>,
    /// Nodes unlinked from their parent but still alive.
    pub detached: Vec<NodeId>,
    /// Nodes freed, including every descendant of a removed subtree root.
    pub removed: Vec<NodeId>,
    /// Nodes whose markup changed.
    pub updated: Vec<NodeId>,
}

impl Mutations {
    /// Returns true when no change was recorded.
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
            && self.detached.is_empty()
            && self.removed.is_empty()
            && self.updated.is_empty()
    }
}
