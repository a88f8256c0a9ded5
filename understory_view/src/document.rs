// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared handle over the document tree.
//!
//! Placeholders, animators, and deferred leave completions all need to reach the
//! same tree at different times, so the tree lives behind a cheap, cloneable
//! single-threaded handle. Borrows are short: callers take one, mutate, and
//! drop it before handing control to any collaborator.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use understory_doc_tree::Tree;

/// Cloneable handle to a [`Tree`].
#[derive(Clone, Default)]
pub struct Document {
    tree: Rc<RefCell<Tree>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tree.try_borrow() {
            Ok(tree) => f.debug_tuple("Document").field(&*tree).finish(),
            Err(_) => f.write_str("Document(<borrowed>)"),
        }
    }
}

impl Document {
    /// Create a handle over an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle over an existing tree.
    pub fn from_tree(tree: Tree) -> Self {
        Self {
            tree: Rc::new(RefCell::new(tree)),
        }
    }

    /// Borrow the tree for reading.
    pub fn tree(&self) -> Ref<'_, Tree> {
        self.tree.borrow()
    }

    /// Borrow the tree for writing.
    pub fn tree_mut(&self) -> RefMut<'_, Tree> {
        self.tree.borrow_mut()
    }
}
