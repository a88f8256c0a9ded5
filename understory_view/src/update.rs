// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The update state machine.
//!
//! ```text
//! Uninitialized ──Empty──▶ DefaultRendered ◀──Empty── Bound(x)
//!       │                        │                     ▲  │
//!       └──────Resolved(y)───────┴─────Resolved(y)─────┘  └─ Resolved(x): no-op
//! ```
//!
//! Every transition except the `Resolved(x)` no-op releases the current content
//! and binding context before building new ones. The no-op applies whenever `x`
//! is the bundle mounted last, even if fallback content was shown in between.
//! The origin node is swapped for the anchor on the first update only.

use std::rc::Rc;

use tracing::{debug, instrument};
use understory_doc_tree::NodeId;

use crate::error::ViewError;
use crate::host::LinkContext;
use crate::placeholder::{Placeholder, VIEW_NAME_KEY, VIEW_STATE_KEY};
use crate::types::{LocalsBundle, Notification, ResolvedLocals};

/// Where a placeholder's update state machine stands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewPhase {
    /// Never updated; the origin node is still in the document.
    Uninitialized,
    /// Showing the fallback content.
    DefaultRendered,
    /// Showing content for the locals in [`Placeholder::last_applied`].
    Bound,
}

/// Which transition an [`update`](Placeholder::update) performed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The router had nothing for this view; fallback content was mounted.
    DefaultRendered,
    /// The same locals were already mounted; nothing changed.
    Unchanged,
    /// Resolved content was mounted.
    Mounted,
}

impl Placeholder {
    /// Bring this placeholder in line with the router's active state.
    ///
    /// `should_animate` governs only the fallback path; resolved content always
    /// enters through an animation-eligible strategy. `force` remounts even when
    /// the router hands back the locals that are already mounted.
    ///
    /// Failures from the compiler, linker, controller factory, or evaluator are
    /// returned as-is. Content already mounted by this call stays in place.
    #[instrument(level = "debug", skip(self), fields(view = %self.name()))]
    pub fn update(&self, should_animate: bool, force: bool) -> Result<UpdateOutcome, ViewError> {
        let bundle = self.0.env.router().locals(&self.0.name);
        self.replace_origin_once()?;
        match bundle {
            LocalsBundle::Empty => {
                self.render_default(should_animate)?;
                debug!("rendered fallback content");
                Ok(UpdateOutcome::DefaultRendered)
            }
            LocalsBundle::Resolved(locals) => {
                let unchanged = !force
                    && self
                        .0
                        .state
                        .borrow()
                        .last_applied
                        .as_ref()
                        .is_some_and(|applied| Rc::ptr_eq(applied, &locals));
                if unchanged {
                    debug!("locals unchanged");
                    return Ok(UpdateOutcome::Unchanged);
                }
                self.mount(&locals)?;
                debug!(state = locals.state.name(), "mounted view content");
                Ok(UpdateOutcome::Mounted)
            }
        }
    }

    fn replace_origin_once(&self) -> Result<(), ViewError> {
        if self.0.state.borrow().default_replaced {
            return Ok(());
        }
        self.0
            .env
            .document()
            .tree_mut()
            .replace_with(self.0.origin, self.0.anchor)?;
        self.0.state.borrow_mut().default_replaced = true;
        Ok(())
    }

    // A detached copy of the origin carrying `markup`, recorded as current content.
    fn fresh_content(&self, markup: &str) -> Result<NodeId, ViewError> {
        let content = {
            let mut tree = self.0.env.document().tree_mut();
            let content = tree.clone_shallow(self.0.origin)?;
            tree.set_markup(content, markup)?;
            content
        };
        self.0.state.borrow_mut().content = Some(content);
        Ok(content)
    }

    fn render_default(&self, should_animate: bool) -> Result<(), ViewError> {
        let env = &self.0.env;
        self.cleanup_current();
        self.0.state.borrow_mut().bound = false;

        let content = self.fresh_content(&self.0.initial)?;
        env.renderer().strategy(should_animate).enter(
            env.document(),
            content,
            self.0.parent_node,
            self.0.anchor,
        )?;
        let scope = env.scopes().new_child(self.0.scope)?;
        self.0.state.borrow_mut().scope = Some(scope);

        let linker = env.compiler().compile(env.document(), content)?;
        // Fallback content carries no view tag, so nested views see our own parent.
        let parent = self.parent();
        linker(&LinkContext {
            env,
            scope,
            content,
            parent: parent.as_ref(),
        })
    }

    fn mount(&self, locals: &Rc<ResolvedLocals>) -> Result<(), ViewError> {
        let env = &self.0.env;
        let document = env.document();
        self.cleanup_current();

        let markup = locals.template.as_deref().unwrap_or(&self.0.initial);
        let content = self.fresh_content(markup)?;
        env.renderer()
            .strategy(true)
            .enter(document, content, self.0.parent_node, self.0.anchor)?;
        {
            let mut tree = document.tree_mut();
            tree.set_data(content, VIEW_NAME_KEY, self.0.name.as_str())?;
            tree.set_data(content, VIEW_STATE_KEY, locals.state.name())?;
        }
        {
            let mut state = self.0.state.borrow_mut();
            state.last_applied = Some(locals.clone());
            state.bound = true;
        }

        let linker = env.compiler().compile(document, content)?;
        let scope = env.scopes().new_child(self.0.scope)?;
        self.0.state.borrow_mut().scope = Some(scope);

        if let Some(controller) = &locals.controller {
            let handle = env.controllers().instantiate(controller, scope, locals)?;
            self.0.state.borrow_mut().controller = Some(handle);
        }

        linker(&LinkContext {
            env,
            scope,
            content,
            parent: Some(self),
        })?;
        env.scopes().emit(scope, Notification::ViewContentLoaded)?;

        if let Some(onload) = self.0.config.onload_expression() {
            env.evaluator().evaluate(scope, onload)?;
        }
        let scroll = match self.0.config.autoscroll_expression() {
            Some(expr) => env.evaluator().evaluate(self.0.scope, expr)?,
            None => true,
        };
        if scroll {
            env.scroll().scroll_into_view(document, content);
        }
        Ok(())
    }
}
