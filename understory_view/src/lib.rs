// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory View: state-driven view placeholders over a document tree.
//!
//! ## Overview
//!
//! A placeholder marks a fixed position in a document and shows whatever content
//! the active application state assigns to its view name.
//! When the state router moves to a new state, every placeholder asks it for the
//! locals of its own name and either keeps what it shows, swaps in new content,
//! or falls back to the markup it was declared with.
//!
//! This crate does not resolve routes, fetch templates, or interpret markup beyond
//! finding nested `<ui-view>` declarations. Those are host collaborators, see [`host`].
//!
//! ## Naming
//!
//! Views are addressed as `local@owner`, where `owner` is the state bound by the
//! nearest enclosing placeholder. A top-level unnamed view is `@`.
//! Names that already contain `@` are taken verbatim. See [`naming`].
//!
//! ## Update
//!
//! [`Placeholder::update`](crate::placeholder::Placeholder::update) runs a small state machine:
//! - the first update swaps the origin node for an anchor comment, once;
//! - no locals: release current content and show the fallback;
//! - the same locals (by identity) as last time: nothing happens;
//! - new locals: release current content, mount the template, bind a fresh
//!   context, instantiate the controller, announce
//!   [`Notification::ViewContentLoaded`](crate::types::Notification::ViewContentLoaded),
//!   run `onload`, then scroll unless `autoscroll` says otherwise.
//!
//! Releasing content destroys its binding context, and with it every nested
//! placeholder. See [`update`] and [`scope`].
//!
//! ## Animation
//!
//! Entering and leaving go through a [`RendererStrategy`](crate::renderer::RendererStrategy).
//! The animation capability is optional and probed once. See [`renderer`].
//!
//! ## Triggers
//!
//! [`Placeholder::link`](crate::placeholder::Placeholder::link) subscribes a
//! placeholder to state-change notifications on its containing context and
//! paints it once. A shared [`ReentrancyGuard`](crate::wiring::ReentrancyGuard)
//! keeps one trigger from starting a second pass while the first is cascading.
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use understory_doc_tree::{LocalNode, NodeKind, Tree};
//! use understory_view::compile::ViewMarkupCompiler;
//! use understory_view::document::Document;
//! use understory_view::host::ViewEnv;
//! use understory_view::placeholder::{Placeholder, PlaceholderConfig};
//! use understory_view::scope::Scopes;
//! use understory_view::state::{ActiveState, ActiveStateRouter};
//! use understory_view::types::{Notification, ResolvedLocals, StateNode};
//!
//! let mut tree = Tree::new();
//! let body = tree.insert(None, LocalNode::default());
//! let origin = tree.insert(
//!     Some(body),
//!     LocalNode { kind: NodeKind::element("ui-view"), markup: "loading".into(), ..Default::default() },
//! );
//! let doc = Document::from_tree(tree);
//! let scopes = Scopes::new();
//! let root = scopes.new_root();
//! let router = Rc::new(ActiveStateRouter::new());
//! let env = Rc::new(ViewEnv::new(
//!     doc.clone(),
//!     scopes.clone(),
//!     router.clone(),
//!     Rc::new(ViewMarkupCompiler),
//! ));
//!
//! let view = Placeholder::link(&env, root, origin, None, PlaceholderConfig::default()).unwrap();
//! let shown = view.current_content().unwrap();
//! assert_eq!(doc.tree().markup(shown), Some("loading"));
//!
//! let home = StateNode::new("home");
//! router.transition_to(
//!     ActiveState::new(home.clone())
//!         .with_view("@", ResolvedLocals::new(home).with_template("<p>hi</p>")),
//! );
//! scopes.broadcast(root, Notification::StateChangeSuccess).unwrap();
//! let shown = view.current_content().unwrap();
//! assert_eq!(doc.tree().markup(shown), Some("<p>hi</p>"));
//! ```
//!
//! Single-threaded: handles are `Rc`-based and the guard is a plain flag.

pub mod compile;
pub mod document;
pub mod error;
pub mod expr;
pub mod host;
pub mod naming;
pub mod placeholder;
pub mod renderer;
pub mod scope;
pub mod state;
pub mod types;
pub mod update;
pub mod wiring;

#[cfg(test)]
mod test_support;

pub use error::ViewError;
pub use placeholder::{Placeholder, PlaceholderConfig};
