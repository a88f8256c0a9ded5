// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the document tree: node identifiers, flags, node payloads, and errors.

use alloc::string::String;

/// Identifier for a node in the tree.
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// ### Liveness
///
/// Use [`Tree::is_alive`](crate::Tree::is_alive) to check whether a `NodeId` still refers to a live node.
/// Stale `NodeId`s never alias a different live node because the generation must match.
///
/// Detaching a node from its parent does not invalidate its `NodeId`; only
/// [`Tree::remove`](crate::Tree::remove) does.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Node flags describing the role and lifecycle of a node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is an insertion marker. Content is placed next to it; it is never replaced.
        const ANCHOR  = 0b0000_0001;
        /// Node is animating out and will be removed once the animation completes.
        const LEAVING = 0b0000_0010;
    }
}

/// What a node is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with the given tag name.
    Element(String),
    /// A comment node carrying its text.
    Comment(String),
}

impl NodeKind {
    /// Convenience constructor for [`NodeKind::Element`].
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element(tag.into())
    }

    /// Convenience constructor for [`NodeKind::Comment`].
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    /// Returns true for comment nodes.
    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }
}

/// Local payload for a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalNode {
    /// Node kind (element or comment).
    pub kind: NodeKind,
    /// Inner markup, uninterpreted by the tree. A compiler downstream decides what it means.
    pub markup: String,
    /// Role and lifecycle flags.
    pub flags: NodeFlags,
}

impl Default for LocalNode {
    fn default() -> Self {
        Self {
            kind: NodeKind::element("div"),
            markup: String::new(),
            flags: NodeFlags::empty(),
        }
    }
}

/// Errors returned by structural tree operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// The node is not (or no longer) alive.
    StaleNode(NodeId),
    /// The operation needs the node to have a parent, and it has none.
    NoParent(NodeId),
    /// Linking `node` under `parent` would make a node its own ancestor.
    Cycle {
        /// Node being placed.
        node: NodeId,
        /// Prospective parent.
        parent: NodeId,
    },
}

impl core::fmt::Display for TreeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::StaleNode(id) => write!(f, "node {id:?} is not alive"),
            Self::NoParent(id) => write!(f, "node {id:?} has no parent"),
            Self::Cycle { node, parent } => {
                write!(f, "placing {node:?} under {parent:?} would create a cycle")
            }
        }
    }
}

impl core::error::Error for TreeError {}
