// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding contexts: a strictly hierarchical arena of scopes.
//!
//! ## Ownership
//!
//! Every scope except a root has exactly one parent. Destroying a scope destroys
//! its whole subtree, runs destroy hooks parent-first, and drops every listener
//! registered on the destroyed scopes. This is how a placeholder that re-renders
//! releases all nested placeholders at once.
//!
//! ## Propagation
//!
//! - [`Scopes::emit`] delivers to the target scope, then to each ancestor up to the root.
//! - [`Scopes::broadcast`] delivers to the origin scope, then to its descendants in
//!   pre-order. Children are read after their parent's listeners ran, so scopes
//!   created by a listener are visited in the same pass.
//!
//! Listener errors stop propagation and are returned to the caller.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_view::scope::Scopes;
//! use understory_view::types::Notification;
//!
//! let scopes = Scopes::new();
//! let root = scopes.new_root();
//! let child = scopes.new_child(root).unwrap();
//!
//! let seen = Rc::new(Cell::new(0));
//! let counter = seen.clone();
//! scopes
//!     .on(root, Notification::ViewContentLoaded, move |_| {
//!         counter.set(counter.get() + 1);
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! // Emitted on the child, heard on the root.
//! scopes.emit(child, Notification::ViewContentLoaded).unwrap();
//! assert_eq!(seen.get(), 1);
//!
//! scopes.destroy(root);
//! assert!(!scopes.is_alive(child));
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

use crate::error::ViewError;
use crate::types::Notification;

/// Identifier for a binding context (generational, like a tree `NodeId`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ScopeId(u32, u32);

impl ScopeId {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A notification as seen by one listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScopeEvent {
    /// What happened.
    pub notification: Notification,
    /// Scope the notification was emitted or broadcast on.
    pub target: ScopeId,
    /// Scope whose listener is running.
    pub current: ScopeId,
}

/// Listener callback registered with [`Scopes::on`].
pub type Listener = Rc<dyn Fn(&ScopeEvent) -> Result<(), ViewError>>;

type DestroyHook = Box<dyn FnOnce()>;

struct Slot {
    generation: u32,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    listeners: Vec<(Notification, Listener)>,
    on_destroy: Vec<DestroyHook>,
    locals: BTreeMap<String, Value>,
}

impl Slot {
    fn new(generation: u32, parent: Option<ScopeId>) -> Self {
        Self {
            generation,
            parent,
            children: Vec::new(),
            listeners: Vec::new(),
            on_destroy: Vec::new(),
            locals: BTreeMap::new(),
        }
    }
}

#[derive(Default)]
struct Arena {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl Arena {
    fn alloc(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(Slot::new(generation, parent));
            (idx, generation)
        } else {
            self.slots.push(Some(Slot::new(1, parent)));
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "ScopeId uses 32-bit slot indices."
        )]
        let id = ScopeId(idx as u32, generation);
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.push(id);
        }
        id
    }

    fn get(&self, id: ScopeId) -> Option<&Slot> {
        self.slots
            .get(id.idx())?
            .as_ref()
            .filter(|s| s.generation == id.1)
    }

    fn get_mut(&mut self, id: ScopeId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.idx())?
            .as_mut()
            .filter(|s| s.generation == id.1)
    }

    fn subtree_preorder(&self, id: ScopeId, out: &mut Vec<ScopeId>) {
        if let Some(slot) = self.get(id) {
            out.push(id);
            for &c in &slot.children {
                self.subtree_preorder(c, out);
            }
        }
    }
}

/// Cloneable handle to a hierarchy of binding contexts.
#[derive(Clone, Default)]
pub struct Scopes {
    arena: Rc<RefCell<Arena>>,
}

impl fmt::Debug for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scopes")
            .field("alive", &self.len())
            .finish_non_exhaustive()
    }
}

impl Scopes {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope with no parent.
    pub fn new_root(&self) -> ScopeId {
        self.arena.borrow_mut().alloc(None)
    }

    /// Create a child of `parent`.
    pub fn new_child(&self, parent: ScopeId) -> Result<ScopeId, ViewError> {
        let mut arena = self.arena.borrow_mut();
        if arena.get(parent).is_none() {
            return Err(ViewError::DeadScope(parent));
        }
        Ok(arena.alloc(Some(parent)))
    }

    /// Returns true if `id` refers to a live scope.
    pub fn is_alive(&self, id: ScopeId) -> bool {
        self.arena.borrow().get(id).is_some()
    }

    /// Parent of `id`, if alive and not a root.
    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.arena.borrow().get(id)?.parent
    }

    /// Children of `id` in creation order.
    pub fn children(&self, id: ScopeId) -> Vec<ScopeId> {
        self.arena
            .borrow()
            .get(id)
            .map(|s| s.children.clone())
            .unwrap_or_default()
    }

    /// Number of live scopes.
    pub fn len(&self) -> usize {
        self.arena
            .borrow()
            .slots
            .iter()
            .filter(|s| s.is_some())
            .count()
    }

    /// Returns true if no scope is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a listener for `notification` on `id`.
    pub fn on(
        &self,
        id: ScopeId,
        notification: Notification,
        listener: impl Fn(&ScopeEvent) -> Result<(), ViewError> + 'static,
    ) -> Result<(), ViewError> {
        let mut arena = self.arena.borrow_mut();
        let slot = arena.get_mut(id).ok_or(ViewError::DeadScope(id))?;
        slot.listeners.push((notification, Rc::new(listener)));
        Ok(())
    }

    /// Register a hook that runs once when `id` is destroyed.
    pub fn on_destroy(&self, id: ScopeId, hook: impl FnOnce() + 'static) -> Result<(), ViewError> {
        let mut arena = self.arena.borrow_mut();
        let slot = arena.get_mut(id).ok_or(ViewError::DeadScope(id))?;
        slot.on_destroy.push(Box::new(hook));
        Ok(())
    }

    /// Destroy `id` and all of its descendants. Stale ids are ignored.
    pub fn destroy(&self, id: ScopeId) {
        let released = {
            let mut arena = self.arena.borrow_mut();
            let mut order = Vec::new();
            arena.subtree_preorder(id, &mut order);
            if order.is_empty() {
                return;
            }
            if let Some(parent) = arena.get(id).and_then(|s| s.parent) {
                if let Some(p) = arena.get_mut(parent) {
                    p.children.retain(|&c| c != id);
                }
            }
            let mut released = Vec::with_capacity(order.len());
            for sid in order {
                if let Some(slot) = arena.slots[sid.idx()].take() {
                    arena.free_list.push(sid.idx());
                    released.push(slot);
                }
            }
            released
        };
        trace!(scope = ?id, count = released.len(), "destroyed binding contexts");
        // Hooks run and listeners drop with the arena released; both may call back in.
        for slot in released {
            for hook in slot.on_destroy {
                hook();
            }
        }
    }

    /// Deliver `notification` to `id`, then to each ancestor.
    pub fn emit(&self, id: ScopeId, notification: Notification) -> Result<(), ViewError> {
        if !self.is_alive(id) {
            return Err(ViewError::DeadScope(id));
        }
        let mut cur = Some(id);
        while let Some(c) = cur {
            self.deliver(c, id, notification)?;
            cur = self.parent(c);
        }
        Ok(())
    }

    /// Deliver `notification` to `id`, then to its descendants in pre-order.
    pub fn broadcast(&self, id: ScopeId, notification: Notification) -> Result<(), ViewError> {
        if !self.is_alive(id) {
            return Err(ViewError::DeadScope(id));
        }
        self.broadcast_from(id, id, notification)
    }

    /// Set a value visible to `id` and its descendants.
    pub fn set_local(
        &self,
        id: ScopeId,
        key: impl Into<String>,
        value: Value,
    ) -> Result<(), ViewError> {
        let mut arena = self.arena.borrow_mut();
        let slot = arena.get_mut(id).ok_or(ViewError::DeadScope(id))?;
        slot.locals.insert(key.into(), value);
        Ok(())
    }

    /// Look up `key` on `id`, falling back to its ancestors.
    pub fn lookup(&self, id: ScopeId, key: &str) -> Option<Value> {
        let arena = self.arena.borrow();
        let mut cur = Some(id);
        while let Some(c) = cur {
            let slot = arena.get(c)?;
            if let Some(v) = slot.locals.get(key) {
                return Some(v.clone());
            }
            cur = slot.parent;
        }
        None
    }

    fn broadcast_from(
        &self,
        id: ScopeId,
        target: ScopeId,
        notification: Notification,
    ) -> Result<(), ViewError> {
        if !self.is_alive(id) {
            return Ok(());
        }
        self.deliver(id, target, notification)?;
        for child in self.children(id) {
            self.broadcast_from(child, target, notification)?;
        }
        Ok(())
    }

    fn deliver(
        &self,
        current: ScopeId,
        target: ScopeId,
        notification: Notification,
    ) -> Result<(), ViewError> {
        let listeners: Vec<Listener> = {
            let arena = self.arena.borrow();
            let Some(slot) = arena.get(current) else {
                return Ok(());
            };
            slot.listeners
                .iter()
                .filter(|(n, _)| *n == notification)
                .map(|(_, l)| l.clone())
                .collect()
        };
        let event = ScopeEvent {
            notification,
            target,
            current,
        };
        for listener in listeners {
            // A previous listener may have destroyed this scope.
            if !self.is_alive(current) {
                break;
            }
            listener(&event)?;
        }
        Ok(())
    }
}
