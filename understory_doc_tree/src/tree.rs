// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, placement, node data, and queries.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::mutations::Mutations;
use crate::types::{LocalNode, NodeFlags, NodeId, TreeError};

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-level document tree.
pub struct Tree {
    nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    epoch: u64,
    pending: Mutations,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.len();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: LocalNode,
    data: BTreeMap<String, String>,
}

impl Node {
    fn new(generation: u32, local: LocalNode) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            local,
            data: BTreeMap::new(),
        }
    }
}

impl Tree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            epoch: 0,
            pending: Mutations::default(),
        }
    }

    /// Insert a new node as the last child of `parent` (or detached if `None`).
    ///
    /// A stale `parent` leaves the new node detached.
    pub fn insert(&mut self, parent: Option<NodeId>, local: LocalNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit slot indices."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit slot indices."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent.filter(|p| self.is_alive(*p)) {
            self.link_at(id, p, None);
        }
        id
    }

    /// Remove a node (and its subtree) from the tree. Stale ids are ignored.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink(id, parent);
        }
        self.free_subtree(id);
    }

    /// Unlink `id` from its parent, keeping it alive for later placement.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        if let Some(parent) = self.node(id).parent {
            self.unlink(id, parent);
            self.pending.detached.push(id);
        }
        Ok(())
    }

    /// Move `id` to be the last child of `parent`.
    pub fn append(&mut self, id: NodeId, parent: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        self.check(parent)?;
        self.check_acyclic(id, parent)?;
        self.detach_quiet(id);
        self.link_at(id, parent, None);
        Ok(())
    }

    /// Move `id` to sit immediately after `anchor` under `anchor`'s parent.
    pub fn insert_after(&mut self, id: NodeId, anchor: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        self.check(anchor)?;
        let parent = self.node(anchor).parent.ok_or(TreeError::NoParent(anchor))?;
        if id == anchor {
            return Err(TreeError::Cycle { node: id, parent });
        }
        self.check_acyclic(id, parent)?;
        self.detach_quiet(id);
        let pos = self.position_in_parent(anchor, parent);
        self.link_at(id, parent, Some(pos + 1));
        Ok(())
    }

    /// Put `replacement` in the place `id` occupies, leaving `id` detached but alive.
    pub fn replace_with(&mut self, id: NodeId, replacement: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        self.check(replacement)?;
        if id == replacement {
            return Ok(());
        }
        let parent = self.node(id).parent.ok_or(TreeError::NoParent(id))?;
        self.check_acyclic(replacement, parent)?;
        // `replacement` may live inside `id`; it must leave that subtree first.
        self.detach_quiet(replacement);
        let pos = self.position_in_parent(id, parent);
        self.node_mut(parent).children[pos] = replacement;
        self.node_mut(replacement).parent = Some(parent);
        self.node_mut(id).parent = None;
        self.pending.detached.push(id);
        self.pending.attached.push(replacement);
        Ok(())
    }

    /// Create a detached copy of `id`'s local payload. Children and data are not copied.
    pub fn clone_shallow(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        self.check(id)?;
        let local = self.node(id).local.clone();
        Ok(self.insert(None, local))
    }

    /// Replace the inner markup of `id`.
    pub fn set_markup(&mut self, id: NodeId, markup: impl Into<String>) -> Result<(), TreeError> {
        self.check(id)?;
        self.node_mut(id).local.markup = markup.into();
        self.pending.updated.push(id);
        Ok(())
    }

    /// Inner markup of `id`, if alive.
    pub fn markup(&self, id: NodeId) -> Option<&str> {
        self.node_opt(id).map(|n| n.local.markup.as_str())
    }

    /// Local payload of `id`, if alive.
    pub fn local(&self, id: NodeId) -> Option<&LocalNode> {
        self.node_opt(id).map(|n| &n.local)
    }

    /// Flags of `id`, if alive.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|n| n.local.flags)
    }

    /// Update flags. Stale ids are ignored.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(node) = self.node_opt_mut(id) {
            node.local.flags = flags;
        }
    }

    /// Attach a keyed string to `id`.
    pub fn set_data(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TreeError> {
        self.check(id)?;
        self.node_mut(id).data.insert(key.into(), value.into());
        Ok(())
    }

    /// Data stored on `id` under `key`.
    pub fn data(&self, id: NodeId, key: &str) -> Option<&str> {
        self.node_opt(id)?.data.get(key).map(String::as_str)
    }

    /// Data stored under `key` on `id` or its nearest ancestor that has it.
    pub fn inherited_data(&self, id: NodeId, key: &str) -> Option<&str> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let node = self.node_opt(c)?;
            if let Some(v) = node.data.get(key) {
                return Some(v.as_str());
            }
            cur = node.parent;
        }
        None
    }

    /// Parent of `id`, if alive and attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id)?.parent
    }

    /// Children of `id` in document order. Empty for stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// The sibling immediately after `id`, if any.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Returns true if `id` or any of its ancestors is flagged [`NodeFlags::LEAVING`].
    pub fn is_leaving(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let Some(node) = self.node_opt(c) else {
                return false;
            };
            if node.local.flags.contains(NodeFlags::LEAVING) {
                return true;
            }
            cur = node.parent;
        }
        false
    }

    /// Path from the outermost ancestor to `id` (inclusive). Empty for stale ids.
    pub fn path_to_root(&self, mut id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        if !self.is_alive(id) {
            return path;
        }
        path.push(id);
        while let Some(p) = self.node(id).parent {
            path.push(p);
            id = p;
        }
        path.reverse();
        path
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|slot| slot.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Returns true if no node is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of commits performed so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Drain the mutation records accumulated since the previous commit.
    pub fn commit(&mut self) -> Mutations {
        self.epoch = self.epoch.wrapping_add(1);
        core::mem::take(&mut self.pending)
    }

    fn check(&self, id: NodeId) -> Result<(), TreeError> {
        if self.is_alive(id) {
            Ok(())
        } else {
            Err(TreeError::StaleNode(id))
        }
    }

    // `parent` must not be `id` or one of its descendants.
    fn check_acyclic(&self, id: NodeId, parent: NodeId) -> Result<(), TreeError> {
        let mut cur = Some(parent);
        while let Some(c) = cur {
            if c == id {
                return Err(TreeError::Cycle { node: id, parent });
            }
            cur = self.node(c).parent;
        }
        Ok(())
    }

    fn detach_quiet(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.unlink(id, parent);
        }
    }

    fn position_in_parent(&self, id: NodeId, parent: NodeId) -> usize {
        self.node(parent)
            .children
            .iter()
            .position(|&c| c == id)
            .unwrap_or(0)
    }

    fn link_at(&mut self, id: NodeId, parent: NodeId, at: Option<usize>) {
        self.node_mut(id).parent = Some(parent);
        let children = &mut self.node_mut(parent).children;
        match at {
            Some(i) if i <= children.len() => children.insert(i, id),
            _ => children.push(id),
        }
        self.pending.attached.push(id);
    }

    fn unlink(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(id).parent = None;
        if let Some(p) = self.node_opt_mut(parent) {
            p.children.retain(|&c| c != id);
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let children = core::mem::take(&mut self.node_mut(id).children);
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
        self.pending.removed.push(id);
        for child in children {
            if self.is_alive(child) {
                self.free_subtree(child);
            }
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.idx())?
            .as_ref()
            .filter(|n| n.generation == id.1)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.idx())?
            .as_mut()
            .filter(|n| n.generation == id.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;
    use alloc::vec;

    fn element(tree: &mut Tree, parent: Option<NodeId>, markup: &str) -> NodeId {
        tree.insert(
            parent,
            LocalNode {
                markup: markup.into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn insert_appends_in_order() {
        let mut tree = Tree::new();
        let root = element(&mut tree, None, "");
        let a = element(&mut tree, Some(root), "a");
        let b = element(&mut tree, Some(root), "b");
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.next_sibling(b), None);
        assert_eq!(tree.path_to_root(b), vec![root, b]);
    }

    #[test]
    fn insert_after_places_next_to_anchor() {
        let mut tree = Tree::new();
        let root = element(&mut tree, None, "");
        let a = element(&mut tree, Some(root), "a");
        let b = element(&mut tree, Some(root), "b");
        let c = element(&mut tree, None, "c");
        tree.insert_after(c, a).unwrap();
        assert_eq!(tree.children(root), &[a, c, b]);

        // Moving within the same parent keeps a single entry.
        tree.insert_after(c, b).unwrap();
        assert_eq!(tree.children(root), &[a, b, c]);
    }

    #[test]
    fn insert_after_requires_attached_anchor() {
        let mut tree = Tree::new();
        let lone = element(&mut tree, None, "");
        let c = element(&mut tree, None, "");
        assert_eq!(tree.insert_after(c, lone), Err(TreeError::NoParent(lone)));
        assert_eq!(
            tree.insert_after(lone, lone),
            Err(TreeError::NoParent(lone))
        );
    }

    #[test]
    fn replace_with_swaps_slot_and_keeps_original_alive() {
        let mut tree = Tree::new();
        let root = element(&mut tree, None, "");
        let before = element(&mut tree, Some(root), "");
        let origin = element(&mut tree, Some(root), "origin");
        let after = element(&mut tree, Some(root), "");
        let marker = tree.insert(
            None,
            LocalNode {
                kind: NodeKind::comment(" marker "),
                flags: NodeFlags::ANCHOR,
                ..Default::default()
            },
        );
        tree.replace_with(origin, marker).unwrap();
        assert_eq!(tree.children(root), &[before, marker, after]);
        assert!(tree.is_alive(origin));
        assert_eq!(tree.parent(origin), None);
        assert_eq!(tree.markup(origin), Some("origin"));
    }

    #[test]
    fn replace_with_pulls_replacement_out_of_the_replaced_subtree() {
        let mut tree = Tree::new();
        let root = element(&mut tree, None, "");
        let origin = element(&mut tree, Some(root), "");
        let inner = element(&mut tree, Some(origin), "");
        tree.replace_with(origin, inner).unwrap();
        assert_eq!(tree.children(root), &[inner]);
        assert!(tree.children(origin).is_empty());
    }

    #[test]
    fn append_rejects_cycles() {
        let mut tree = Tree::new();
        let root = element(&mut tree, None, "");
        let child = element(&mut tree, Some(root), "");
        assert_eq!(
            tree.append(root, child),
            Err(TreeError::Cycle {
                node: root,
                parent: child
            })
        );
    }

    #[test]
    fn remove_frees_subtree_and_generations_advance() {
        let mut tree = Tree::new();
        let root = element(&mut tree, None, "");
        let a = element(&mut tree, Some(root), "");
        let a1 = element(&mut tree, Some(a), "");
        let _ = tree.commit();

        tree.remove(a);
        assert!(!tree.is_alive(a));
        assert!(!tree.is_alive(a1));
        assert!(tree.children(root).is_empty());
        let m = tree.commit();
        assert_eq!(m.removed, vec![a, a1]);

        // Reused slot yields a distinct id; the stale one stays dead.
        let b = element(&mut tree, Some(root), "");
        assert_ne!(a, b);
        assert!(!tree.is_alive(a));
        assert_eq!(tree.detach(a), Err(TreeError::StaleNode(a)));
    }

    #[test]
    fn clone_shallow_copies_payload_only() {
        let mut tree = Tree::new();
        let root = element(&mut tree, None, "");
        let origin = element(&mut tree, Some(root), "<p>x</p>");
        let _kid = element(&mut tree, Some(origin), "");
        tree.set_data(origin, "k", "v").unwrap();

        let copy = tree.clone_shallow(origin).unwrap();
        assert_eq!(tree.markup(copy), Some("<p>x</p>"));
        assert!(tree.children(copy).is_empty());
        assert_eq!(tree.data(copy, "k"), None);
        assert_eq!(tree.parent(copy), None);
    }

    #[test]
    fn data_inherits_from_ancestors() {
        let mut tree = Tree::new();
        let root = element(&mut tree, None, "");
        let mid = element(&mut tree, Some(root), "");
        let leaf = element(&mut tree, Some(mid), "");
        tree.set_data(root, "view", "outer").unwrap();
        assert_eq!(tree.inherited_data(leaf, "view"), Some("outer"));
        tree.set_data(mid, "view", "inner").unwrap();
        assert_eq!(tree.inherited_data(leaf, "view"), Some("inner"));
        assert_eq!(tree.data(leaf, "view"), None);
    }

    #[test]
    fn leaving_flag_is_seen_by_descendants() {
        let mut tree = Tree::new();
        let root = element(&mut tree, None, "");
        let mid = element(&mut tree, Some(root), "");
        let leaf = element(&mut tree, Some(mid), "");
        assert!(!tree.is_leaving(leaf));
        tree.set_flags(mid, NodeFlags::LEAVING);
        assert!(tree.is_leaving(leaf));
        assert!(!tree.is_leaving(root));
    }

    #[test]
    fn commit_drains_records() {
        let mut tree = Tree::new();
        let root = element(&mut tree, None, "");
        let a = element(&mut tree, Some(root), "");
        tree.set_markup(a, "hello").unwrap();
        let m = tree.commit();
        assert_eq!(m.attached, vec![a]);
        assert_eq!(m.updated, vec![a]);
        assert_eq!(tree.epoch(), 1);
        assert!(tree.commit().is_empty());
    }
}
