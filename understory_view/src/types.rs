// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for views: names, states, locals bundles, controllers, and notifications.
//!
//! ## Overview
//!
//! These types describe what the state router hands to a placeholder and what a
//! placeholder announces back.
//! They are consumed by [`Placeholder::update`](crate::placeholder::Placeholder::update) and by host collaborators.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

/// Hierarchical address of a placeholder, `local@owner`.
///
/// `owner` is the name of the state whose content contains the placeholder
/// (empty at the top level). See [`resolve_view_name`](crate::naming::resolve_view_name).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewName(String);

impl ViewName {
    /// Wrap an already qualified name verbatim.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The full `local@owner` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segment before the first `@` (the whole name if there is none).
    pub fn local(&self) -> &str {
        self.0.split_once('@').map_or(self.0.as_str(), |(l, _)| l)
    }

    /// Segment after the first `@` (empty if there is none).
    pub fn owner(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, o)| o)
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ViewName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A node in the router's state hierarchy, as seen by views.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateNode {
    name: String,
}

impl StateNode {
    /// Create a state node with the given dotted name.
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self { name: name.into() })
    }

    /// Full state name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Name of a controller to instantiate for mounted content.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerRef(String);

impl ControllerRef {
    /// Wrap a controller name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The controller name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControllerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ControllerRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// An instantiated controller, opaque to the placeholder.
pub type ControllerHandle = Rc<dyn Any>;

/// Content resolved by the router for one view name under the active state.
#[derive(Clone, Debug)]
pub struct ResolvedLocals {
    /// Markup to mount. `None` mounts the placeholder's initial markup instead.
    pub template: Option<String>,
    /// Controller to instantiate against the new binding context.
    pub controller: Option<ControllerRef>,
    /// State that owns this content; recorded for descendant naming.
    pub state: Rc<StateNode>,
    /// Resolved values handed to the controller.
    pub extra: BTreeMap<String, Value>,
}

impl ResolvedLocals {
    /// Locals owned by `state` with no template, controller, or extra data.
    pub fn new(state: Rc<StateNode>) -> Self {
        Self {
            template: None,
            controller: None,
            state,
            extra: BTreeMap::new(),
        }
    }

    /// Set the template markup.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the controller reference.
    pub fn with_controller(mut self, controller: impl Into<ControllerRef>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// Add one resolved value.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// The router's answer for a view name.
///
/// Two `Resolved` bundles are the same only if they share an allocation
/// (`Rc::ptr_eq`); structurally equal bundles built separately are different.
#[derive(Clone, Debug, Default)]
pub enum LocalsBundle {
    /// Nothing is configured for this name at the active state.
    #[default]
    Empty,
    /// Content to mount.
    Resolved(Rc<ResolvedLocals>),
}

impl LocalsBundle {
    /// Wrap fresh locals into a new identity.
    pub fn resolved(locals: ResolvedLocals) -> Self {
        Self::Resolved(Rc::new(locals))
    }

    /// Returns true for [`LocalsBundle::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Notifications exchanged over binding contexts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Notification {
    /// The router finished a transition.
    StateChangeSuccess,
    /// The router is about to load view content.
    ViewContentLoading,
    /// A placeholder mounted resolved content. Emitted on the new context.
    ViewContentLoaded,
}

impl Notification {
    /// Wire name of the notification.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StateChangeSuccess => "state-change-succeeded",
            Self::ViewContentLoading => "view-content-loading",
            Self::ViewContentLoaded => "view-content-loaded",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
