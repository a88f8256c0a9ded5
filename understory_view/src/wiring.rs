// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event wiring: linking a placeholder into its binding context and reacting to triggers.
//!
//! A linked placeholder listens on its containing context for
//! [`Notification::StateChangeSuccess`] and [`Notification::ViewContentLoading`].
//! Both run [`Placeholder::update`] with animation requested, behind the
//! environment's [`ReentrancyGuard`]: while one triggered update is cascading
//! through nested placeholders, further triggers are ignored.
//!
//! The guard is released when the [`GuardTicket`] drops, so a failing update
//! clears it before the error reaches whoever broadcast the notification.
//!
//! The first paint at link time calls [`Placeholder::update`] directly and does
//! not take the guard.

use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;
use understory_doc_tree::NodeId;

use crate::error::ViewError;
use crate::host::ViewEnv;
use crate::placeholder::{Placeholder, PlaceholderConfig};
use crate::scope::ScopeId;
use crate::types::Notification;
use crate::update::UpdateOutcome;

/// Notifications that make a linked placeholder update.
pub const TRIGGERS: [Notification; 2] = [
    Notification::StateChangeSuccess,
    Notification::ViewContentLoading,
];

/// A single-holder flag shared by every placeholder of one tree.
///
/// ```
/// use understory_view::wiring::ReentrancyGuard;
///
/// let guard = ReentrancyGuard::new();
/// let ticket = guard.try_acquire().unwrap();
/// assert!(guard.is_held());
/// assert!(guard.try_acquire().is_none());
/// drop(ticket);
/// assert!(!guard.is_held());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ReentrancyGuard {
    held: Rc<Cell<bool>>,
}

impl ReentrancyGuard {
    /// A released guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a [`GuardTicket`] is alive.
    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    /// Take the guard, or `None` if it is already held.
    pub fn try_acquire(&self) -> Option<GuardTicket> {
        if self.held.replace(true) {
            return None;
        }
        Some(GuardTicket {
            held: self.held.clone(),
        })
    }
}

/// Proof of holding a [`ReentrancyGuard`]. Dropping it releases the guard.
#[must_use = "the guard is released as soon as the ticket is dropped"]
#[derive(Debug)]
pub struct GuardTicket {
    held: Rc<Cell<bool>>,
}

impl Drop for GuardTicket {
    fn drop(&mut self) {
        self.held.set(false);
    }
}

impl Placeholder {
    /// Build a placeholder, subscribe it to triggers on `scope`, and paint it once.
    ///
    /// The placeholder lives as long as `scope`; destroying `scope` tears it down.
    pub fn link(
        env: &Rc<ViewEnv>,
        scope: ScopeId,
        origin: NodeId,
        parent: Option<&Self>,
        config: PlaceholderConfig,
    ) -> Result<Self, ViewError> {
        let placeholder = Self::new(env, scope, origin, parent, config)?;
        let scopes = env.scopes();
        for notification in TRIGGERS {
            let p = placeholder.clone();
            scopes.on(scope, notification, move |_| p.on_trigger().map(drop))?;
        }
        let p = placeholder.clone();
        scopes.on_destroy(scope, move || p.teardown())?;
        placeholder.update(false, false)?;
        Ok(placeholder)
    }

    /// Run a triggered update unless another one is already in flight.
    ///
    /// Returns `Ok(None)` when the trigger was ignored.
    pub fn on_trigger(&self) -> Result<Option<UpdateOutcome>, ViewError> {
        let Some(_ticket) = self.0.env.guard().try_acquire() else {
            trace!(view = %self.0.name, "update in flight, trigger ignored");
            return Ok(None);
        };
        self.update(true, false).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::{VIEW_NAME_KEY, VIEW_STATE_KEY};
    use crate::state::ActiveState;
    use crate::test_support::Fixture;
    use crate::types::{ResolvedLocals, StateNode};

    #[test]
    fn trigger_is_ignored_while_guard_is_held() {
        let fx = Fixture::new("");
        let p = fx.link_root(PlaceholderConfig::default()).unwrap();
        let ticket = fx.env.guard().try_acquire().unwrap();
        fx.show("home", [("@", ResolvedLocals::new(StateNode::new("home")))]);
        assert!(p.on_trigger().unwrap().is_none());
        drop(ticket);
        assert_eq!(p.on_trigger().unwrap(), Some(UpdateOutcome::Mounted));
    }

    #[test]
    fn failing_update_releases_the_guard() {
        let fx = Fixture::new("");
        let p = fx.link_root(PlaceholderConfig::default()).unwrap();
        let home = StateNode::new("home");
        fx.show(
            "home",
            [("@", ResolvedLocals::new(home.clone()).with_template("!compile-error"))],
        );
        let err = fx.trigger().unwrap_err();
        assert!(matches!(err, ViewError::Compile { .. }));
        assert!(!fx.env.guard().is_held());

        fx.show("home", [("@", ResolvedLocals::new(home).with_template("ok"))]);
        fx.trigger().unwrap();
        assert_eq!(fx.doc.tree().markup(p.current_content().unwrap()), Some("ok"));
    }

    #[test]
    fn reentrant_trigger_during_update_is_ignored() {
        let fx = Fixture::new("");
        let p = fx.link_root(PlaceholderConfig::default()).unwrap();
        let seen_held = Rc::new(Cell::new(false));
        {
            let scopes = fx.scopes.clone();
            let guard = fx.env.guard().clone();
            let seen_held = seen_held.clone();
            let root = fx.root;
            fx.scopes
                .on(root, Notification::ViewContentLoaded, move |_| {
                    seen_held.set(guard.is_held());
                    scopes.broadcast(root, Notification::ViewContentLoading)
                })
                .unwrap();
        }
        fx.show("home", [("@", ResolvedLocals::new(StateNode::new("home")))]);
        fx.log.clear();
        fx.trigger().unwrap();
        assert!(seen_held.get());
        assert_eq!(fx.log.compiled().len(), 1);
        assert!(p.last_applied().is_some());
    }

    #[test]
    fn content_loading_also_triggers() {
        let fx = Fixture::new("");
        let p = fx.link_root(PlaceholderConfig::default()).unwrap();
        fx.show("home", [("@", ResolvedLocals::new(StateNode::new("home")))]);
        fx.scopes
            .broadcast(fx.root, Notification::ViewContentLoading)
            .unwrap();
        assert_eq!(p.bound_state_name().as_deref(), Some("home"));
    }

    #[test]
    fn nested_views_follow_their_parent() {
        let fx = Fixture::new("");
        let users = StateNode::new("users");
        let detail = StateNode::new("users.detail");
        let layout = Rc::new(
            ResolvedLocals::new(users)
                .with_template(r#"<h1>users</h1><ui-view name="detail">pick one</ui-view>"#),
        );
        fx.show_shared("users", "@", layout.clone());
        let outer = fx.link_root(PlaceholderConfig::default()).unwrap();

        // The nested view has nothing configured yet: it shows its fallback.
        let outer_content = outer.current_content().unwrap();
        let inner_anchor = fx.doc.tree().children(outer_content)[0];
        assert!(fx.doc.tree().local(inner_anchor).unwrap().kind.is_comment());
        let inner_content = fx.doc.tree().children(outer_content)[1];
        assert_eq!(fx.doc.tree().markup(inner_content), Some("pick one"));

        // Moving to a child state keeps the layout and fills the nested view.
        let state = fx.router.transition_to(
            ActiveState::new(detail.clone())
                .with_shared_view("@", layout)
                .with_view(
                    "detail@users",
                    ResolvedLocals::new(detail).with_template("<p>ada</p>"),
                ),
        );
        fx.trigger().unwrap();
        assert_eq!(outer.current_content(), Some(outer_content));
        let tree = fx.doc.tree();
        let inner_content = tree.children(outer_content)[1];
        assert_eq!(tree.markup(inner_content), Some("<p>ada</p>"));
        assert_eq!(tree.data(inner_content, VIEW_STATE_KEY), Some("users.detail"));
        assert_eq!(
            tree.inherited_data(inner_content, VIEW_NAME_KEY),
            Some("detail@users")
        );
        assert!(state.view(&"detail@users".into()).is_some());
    }

    #[test]
    fn remounting_the_parent_tears_down_nested_views() {
        let fx = Fixture::new("");
        let users = StateNode::new("users");
        fx.show(
            "users",
            [
                (
                    "@",
                    ResolvedLocals::new(users.clone())
                        .with_template(r#"<ui-view name="detail"></ui-view>"#),
                ),
                (
                    "detail@users",
                    ResolvedLocals::new(users).with_template("<p>detail</p>"),
                ),
            ],
        );
        let outer = fx.link_root(PlaceholderConfig::default()).unwrap();
        let outer_content = outer.current_content().unwrap();
        let inner_content = fx.doc.tree().children(outer_content)[1];
        let before = fx.scopes.len();

        fx.show("home", [("@", ResolvedLocals::new(StateNode::new("home")).with_template("home"))]);
        fx.trigger().unwrap();
        assert!(!fx.doc.tree().is_alive(outer_content));
        assert!(!fx.doc.tree().is_alive(inner_content));
        // Outer view context and nested view context are gone; one new context replaces them.
        assert_eq!(fx.scopes.len(), before - 1);
    }
}
