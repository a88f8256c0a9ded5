// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placeholder instances: per-placeholder state, construction, and cleanup.
//!
//! ## State
//!
//! A placeholder owns, exclusively:
//! - the fallback markup captured from its origin node at construction,
//! - an anchor comment that fixes its insertion point and never moves,
//! - the currently mounted content node and the binding context it was linked against,
//! - the locals it last mounted (compared by identity on the next update).
//!
//! At most one content/context pair is live at a time.
//! [`Placeholder::cleanup_current`] releases both before anything new is built.
//!
//! ## Parents
//!
//! Nested placeholders receive their parent placeholder explicitly at construction
//! (see [`LinkContext`](crate::host::LinkContext)); nothing walks the document to find it.
//! The parent's bound state qualifies the child's view name.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Deserialize;
use tracing::trace;
use understory_doc_tree::{LocalNode, NodeFlags, NodeId, NodeKind, TreeError};

use crate::error::ViewError;
use crate::host::ViewEnv;
use crate::naming::resolve_view_name;
use crate::scope::ScopeId;
use crate::types::{ControllerHandle, ResolvedLocals, ViewName};
use crate::update::ViewPhase;

/// Node data key holding the view name of mounted content.
pub const VIEW_NAME_KEY: &str = "ui-view.name";
/// Node data key holding the bound state name of mounted content.
pub const VIEW_STATE_KEY: &str = "ui-view.state";
/// Text of anchor comments.
pub const ANCHOR_TEXT: &str = " ui-view-anchor ";

/// Per-placeholder configuration, typically read from the origin node's attributes.
///
/// ```
/// use understory_view::placeholder::PlaceholderConfig;
///
/// let config: PlaceholderConfig =
///     serde_json::from_str(r#"{ "ui-view": "detail", "autoscroll": "false" }"#).unwrap();
/// assert_eq!(config.name, "detail");
/// assert_eq!(config.onload, None);
///
/// let config = PlaceholderConfig { onload: Some("loaded = true".into()), ..Default::default() };
/// assert!(config.name.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Declared name. Empty means the unnamed view.
    #[serde(alias = "ui-view")]
    pub name: String,
    /// Evaluated against the new binding context after resolved content mounts.
    pub onload: Option<String>,
    /// Evaluated against the containing context; falsy suppresses scrolling.
    pub autoscroll: Option<String>,
}

impl PlaceholderConfig {
    /// Configuration with only a declared name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn onload_expression(&self) -> Option<&str> {
        self.onload.as_deref().filter(|e| !e.trim().is_empty())
    }

    // Only an empty attribute counts as absent; whitespace is evaluated (and is falsy).
    pub(crate) fn autoscroll_expression(&self) -> Option<&str> {
        self.autoscroll.as_deref().filter(|e| !e.is_empty())
    }
}

/// A placeholder bound into a document and a binding context.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Placeholder(pub(crate) Rc<Inner>);

pub(crate) struct Inner {
    pub(crate) env: Rc<ViewEnv>,
    pub(crate) name: ViewName,
    pub(crate) config: PlaceholderConfig,
    pub(crate) scope: ScopeId,
    pub(crate) origin: NodeId,
    pub(crate) parent_node: NodeId,
    pub(crate) anchor: NodeId,
    pub(crate) initial: String,
    pub(crate) parent: Option<Weak<Inner>>,
    pub(crate) state: RefCell<State>,
}

#[derive(Default)]
pub(crate) struct State {
    pub(crate) default_replaced: bool,
    pub(crate) bound: bool,
    pub(crate) content: Option<NodeId>,
    pub(crate) scope: Option<ScopeId>,
    pub(crate) last_applied: Option<Rc<ResolvedLocals>>,
    pub(crate) controller: Option<ControllerHandle>,
}

impl fmt::Debug for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placeholder")
            .field("name", &self.0.name)
            .field("anchor", &self.0.anchor)
            .field("phase", &self.phase())
            .field("content", &self.current_content())
            .finish_non_exhaustive()
    }
}

impl Placeholder {
    /// Build an unwired placeholder for `origin`, contained in `scope`.
    ///
    /// Captures the origin's markup as fallback content and creates a detached
    /// anchor. Nothing in the document changes until the first
    /// [`update`](Self::update). Most hosts want [`Placeholder::link`], which also
    /// subscribes to triggers and paints once.
    pub fn new(
        env: &Rc<ViewEnv>,
        scope: ScopeId,
        origin: NodeId,
        parent: Option<&Self>,
        config: PlaceholderConfig,
    ) -> Result<Self, ViewError> {
        let name = resolve_view_name(&config.name, parent);
        if !env.scopes().is_alive(scope) {
            return Err(ViewError::DeadScope(scope));
        }
        let (initial, parent_node, anchor) = {
            let mut tree = env.document().tree_mut();
            let initial = tree
                .markup(origin)
                .ok_or(TreeError::StaleNode(origin))?
                .to_owned();
            let Some(parent_node) = tree.parent(origin) else {
                return Err(ViewError::NoParent { view: name });
            };
            let anchor = tree.insert(
                None,
                LocalNode {
                    kind: NodeKind::comment(ANCHOR_TEXT),
                    flags: NodeFlags::ANCHOR,
                    ..Default::default()
                },
            );
            (initial, parent_node, anchor)
        };
        trace!(view = %name, ?anchor, "placeholder created");
        Ok(Self(Rc::new(Inner {
            env: env.clone(),
            name,
            config,
            scope,
            origin,
            parent_node,
            anchor,
            initial,
            parent: parent.map(|p| Rc::downgrade(&p.0)),
            state: RefCell::new(State::default()),
        })))
    }

    /// Fully qualified view name.
    pub fn name(&self) -> &ViewName {
        &self.0.name
    }

    /// Configuration this placeholder was built with.
    pub fn config(&self) -> &PlaceholderConfig {
        &self.0.config
    }

    /// The binding context containing this placeholder.
    pub fn containing_scope(&self) -> ScopeId {
        self.0.scope
    }

    /// The anchor comment marking the insertion point.
    pub fn anchor(&self) -> NodeId {
        self.0.anchor
    }

    /// The origin node, kept detached after the first update as a cloning template.
    pub fn origin(&self) -> NodeId {
        self.0.origin
    }

    /// Fallback markup captured at construction.
    pub fn initial_markup(&self) -> &str {
        &self.0.initial
    }

    /// Parent placeholder, if this one is nested and the parent is still alive.
    pub fn parent(&self) -> Option<Self> {
        self.0.parent.as_ref()?.upgrade().map(Self)
    }

    /// The environment this placeholder renders with.
    pub fn env(&self) -> &Rc<ViewEnv> {
        &self.0.env
    }

    /// Currently mounted content node.
    pub fn current_content(&self) -> Option<NodeId> {
        self.0.state.borrow().content
    }

    /// Binding context of the currently mounted content.
    pub fn current_scope(&self) -> Option<ScopeId> {
        self.0.state.borrow().scope
    }

    /// Locals most recently mounted.
    ///
    /// Kept while fallback content is shown, so the same bundle coming back is
    /// still recognized; cleared only by teardown.
    pub fn last_applied(&self) -> Option<Rc<ResolvedLocals>> {
        self.0.state.borrow().last_applied.clone()
    }

    /// Controller instantiated for the current content, if any.
    pub fn controller(&self) -> Option<ControllerHandle> {
        self.0.state.borrow().controller.clone()
    }

    /// Name of the state bound by the current content, if any.
    pub fn bound_state_name(&self) -> Option<String> {
        self.0
            .state
            .borrow()
            .last_applied
            .as_ref()
            .map(|l| l.state.name().to_owned())
    }

    /// Whether the origin node has been swapped for the anchor.
    pub fn is_default_replaced(&self) -> bool {
        self.0.state.borrow().default_replaced
    }

    /// Where the update state machine currently stands.
    pub fn phase(&self) -> ViewPhase {
        let state = self.0.state.borrow();
        if !state.default_replaced {
            ViewPhase::Uninitialized
        } else if state.bound {
            ViewPhase::Bound
        } else {
            ViewPhase::DefaultRendered
        }
    }

    /// Release the current content and binding context.
    ///
    /// Content leaves through an animation-eligible strategy. The binding context
    /// is destroyed with all of its descendants. Either may be absent; each is
    /// cleared independently.
    pub fn cleanup_current(&self) {
        let (content, scope) = {
            let mut state = self.0.state.borrow_mut();
            state.controller = None;
            (state.content.take(), state.scope.take())
        };
        let env = &self.0.env;
        if let Some(content) = content {
            env.renderer().strategy(true).leave(env.document(), content);
        }
        if let Some(scope) = scope {
            env.scopes().destroy(scope);
        }
    }

    /// Release everything once the containing binding context is gone.
    ///
    /// Content inside a subtree that is already animating out is left for that
    /// animation to remove.
    pub(crate) fn teardown(&self) {
        let (content, scope, replaced) = {
            let mut state = self.0.state.borrow_mut();
            state.controller = None;
            state.bound = false;
            state.last_applied = None;
            (state.content.take(), state.scope.take(), state.default_replaced)
        };
        let env = &self.0.env;
        {
            let mut tree = env.document().tree_mut();
            for node in content.into_iter().chain([self.0.anchor]) {
                if !tree.is_leaving(node) {
                    tree.remove(node);
                }
            }
            if replaced {
                tree.remove(self.0.origin);
            }
        }
        if let Some(scope) = scope {
            env.scopes().destroy(scope);
        }
        trace!(view = %self.0.name, "placeholder torn down");
    }
}
