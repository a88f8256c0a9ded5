// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The state-router seam and a minimal in-memory router.
//!
//! Placeholders never resolve routes. They ask a [`StateRouter`] for the locals
//! of their [`ViewName`] under whatever state is active right now, and treat an
//! absent entry as [`LocalsBundle::Empty`].
//!
//! [`ActiveStateRouter`] is the smallest useful router: the host resolves a state
//! (fetching templates, running resolves, whatever it needs), hands the result
//! over with [`ActiveStateRouter::transition_to`], and then broadcasts
//! [`Notification::StateChangeSuccess`](crate::types::Notification::StateChangeSuccess).
//!
//! ```
//! use understory_view::state::{ActiveState, ActiveStateRouter, StateRouter};
//! use understory_view::types::{ResolvedLocals, StateNode, ViewName};
//!
//! let router = ActiveStateRouter::new();
//! let home = StateNode::new("home");
//! router.transition_to(
//!     ActiveState::new(home.clone())
//!         .with_view("@", ResolvedLocals::new(home).with_template("<p>hi</p>")),
//! );
//!
//! let name = ViewName::new("@");
//! assert!(!router.locals(&name).is_empty());
//! assert!(router.locals(&ViewName::new("side@")).is_empty());
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::{LocalsBundle, ResolvedLocals, StateNode, ViewName};

/// Resolves the locals of a view under the currently active state.
pub trait StateRouter {
    /// Locals for `name`, or [`LocalsBundle::Empty`] when nothing is configured.
    ///
    /// Repeated calls for an unchanged state must return the same `Rc` so that
    /// placeholders can recognise content they already mounted.
    fn locals(&self, name: &ViewName) -> LocalsBundle;
}

/// A fully resolved state: the state node plus the locals of every view it fills.
#[derive(Clone, Debug)]
pub struct ActiveState {
    state: Rc<StateNode>,
    views: HashMap<ViewName, Rc<ResolvedLocals>>,
}

impl ActiveState {
    /// A state that fills no views yet.
    pub fn new(state: Rc<StateNode>) -> Self {
        Self {
            state,
            views: HashMap::new(),
        }
    }

    /// Fill `name` with fresh locals.
    pub fn with_view(self, name: impl Into<ViewName>, locals: ResolvedLocals) -> Self {
        self.with_shared_view(name, Rc::new(locals))
    }

    /// Fill `name` with locals that may be shared with other states.
    ///
    /// Sharing the same `Rc` across states keeps the view mounted through a
    /// transition, since placeholders compare locals by identity.
    pub fn with_shared_view(mut self, name: impl Into<ViewName>, locals: Rc<ResolvedLocals>) -> Self {
        self.views.insert(name.into(), locals);
        self
    }

    /// The state node.
    pub fn state(&self) -> &Rc<StateNode> {
        &self.state
    }

    /// Locals for `name`, if this state fills it.
    pub fn view(&self, name: &ViewName) -> Option<&Rc<ResolvedLocals>> {
        self.views.get(name)
    }
}

/// In-memory router holding the active state.
#[derive(Debug, Default)]
pub struct ActiveStateRouter {
    current: RefCell<Option<Rc<ActiveState>>>,
}

impl ActiveStateRouter {
    /// A router with no active state; every view resolves to empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `state` the active state and return it.
    pub fn transition_to(&self, state: ActiveState) -> Rc<ActiveState> {
        let state = Rc::new(state);
        *self.current.borrow_mut() = Some(state.clone());
        state
    }

    /// Clear the active state.
    pub fn reset(&self) {
        self.current.borrow_mut().take();
    }

    /// The active state, if any.
    pub fn current(&self) -> Option<Rc<ActiveState>> {
        self.current.borrow().clone()
    }
}

impl StateRouter for ActiveStateRouter {
    fn locals(&self, name: &ViewName) -> LocalsBundle {
        self.current
            .borrow()
            .as_ref()
            .and_then(|s| s.view(name).cloned())
            .map_or(LocalsBundle::Empty, LocalsBundle::Resolved)
    }
}
