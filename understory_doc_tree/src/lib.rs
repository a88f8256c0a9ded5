// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_doc_tree --heading-base-level=0

//! Understory Doc Tree: a generational document tree for view hosts.
//!
//! This crate is the structural half of a retained UI document.
//! It knows about parents, children, sibling order, and a small amount of per-node state.
//! It does not parse markup, lay anything out, or paint.
//!
//! - Represents a hierarchy of element and comment nodes with opaque inner markup.
//! - Supports placement relative to a sibling ([`Tree::insert_after`]), in-place substitution
//!   ([`Tree::replace_with`]), and shallow cloning ([`Tree::clone_shallow`]).
//! - Carries keyed string data per node, with ancestor lookup ([`Tree::inherited_data`]).
//! - Records structural changes and hands them out in batches from [`Tree::commit`],
//!   so a host can mirror them into a real rendering backend.
//!
//! ## API overview
//!
//! - [`Tree`]: container managing nodes and their links.
//! - [`LocalNode`]: per-node payload (kind, markup, flags).
//! - [`NodeFlags`]: role and lifecycle bits (anchor markers, nodes animating out).
//! - [`NodeId`]: generational handle of a node.
//! - [`Mutations`]: change records drained by [`Tree::commit`].
//! - [`TreeError`]: failures of structural operations.
//!
//! ## Detached nodes
//!
//! A node can be alive without a parent. Freshly inserted nodes with no parent, clones,
//! and nodes displaced by [`Tree::replace_with`] are all detached.
//! Only [`Tree::remove`] frees a node, together with its whole subtree.
//!
//! ### Minimal usage
//!
//! ```
//! use understory_doc_tree::{LocalNode, NodeFlags, NodeKind, Tree};
//!
//! let mut tree = Tree::new();
//! let body = tree.insert(None, LocalNode::default());
//! let origin = tree.insert(
//!     Some(body),
//!     LocalNode { markup: "fallback".into(), ..Default::default() },
//! );
//!
//! // Swap the origin for a marker comment; the origin stays alive for cloning.
//! let anchor = tree.insert(
//!     None,
//!     LocalNode {
//!         kind: NodeKind::comment(" anchor "),
//!         flags: NodeFlags::ANCHOR,
//!         ..Default::default()
//!     },
//! );
//! tree.replace_with(origin, anchor).unwrap();
//!
//! // Mount a copy of the origin right after the marker.
//! let content = tree.clone_shallow(origin).unwrap();
//! tree.set_markup(content, "<p>hi</p>").unwrap();
//! tree.insert_after(content, anchor).unwrap();
//! assert_eq!(tree.children(body), &[anchor, content]);
//!
//! let changes = tree.commit();
//! assert!(changes.attached.contains(&content));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod mutations;
mod tree;
mod types;

pub use mutations::Mutations;
pub use tree::Tree;
pub use types::{LocalNode, NodeFlags, NodeId, NodeKind, TreeError};
