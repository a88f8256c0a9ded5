// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording collaborators and a ready-made document for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use understory_doc_tree::{LocalNode, NodeId, NodeKind, Tree};

use crate::compile::ViewMarkupCompiler;
use crate::document::Document;
use crate::error::ViewError;
use crate::host::{ContentCompiler, ControllerRegistry, Linker, ScrollHook, ViewEnv};
use crate::placeholder::{Placeholder, PlaceholderConfig};
use crate::renderer::{Animate, CapabilityProbe, LeaveDone, LegacyAnimate};
use crate::scope::{ScopeId, Scopes};
use crate::state::{ActiveState, ActiveStateRouter};
use crate::types::{Notification, ResolvedLocals, StateNode};

/// Something a recording collaborator observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Compiled(NodeId),
    Linked(NodeId),
    ScopeDestroyed(ScopeId),
    Scrolled(NodeId),
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    pub(crate) fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub(crate) fn scrolls(&self) -> Vec<NodeId> {
        self.filter(|e| match e {
            Event::Scrolled(n) => Some(*n),
            _ => None,
        })
    }

    pub(crate) fn compiled(&self) -> Vec<NodeId> {
        self.filter(|e| match e {
            Event::Compiled(n) => Some(*n),
            _ => None,
        })
    }

    fn filter<T>(&self, f: impl Fn(&Event) -> Option<T>) -> Vec<T> {
        self.0.borrow().iter().filter_map(f).collect()
    }
}

/// Wraps [`ViewMarkupCompiler`], logging compiles, links, and context destruction.
///
/// Markup containing `!compile-error` or `!link-error` fails at that step.
pub(crate) struct RecordingCompiler {
    log: Log,
}

impl ContentCompiler for RecordingCompiler {
    fn compile(&self, document: &Document, content: NodeId) -> Result<Linker, ViewError> {
        let markup = document.tree().markup(content).unwrap_or_default().to_owned();
        if markup.contains("!compile-error") {
            return Err(ViewError::Compile {
                node: content,
                reason: "injected".into(),
            });
        }
        self.log.push(Event::Compiled(content));
        let link = ViewMarkupCompiler.compile(document, content)?;
        let log = self.log.clone();
        let fail = markup.contains("!link-error");
        Ok(Box::new(move |cx| {
            if fail {
                return Err(ViewError::Link {
                    node: cx.content,
                    reason: "injected".into(),
                });
            }
            log.push(Event::Linked(cx.content));
            let scope = cx.scope;
            let destroyed = log.clone();
            cx.env
                .scopes()
                .on_destroy(scope, move || destroyed.push(Event::ScopeDestroyed(scope)))?;
            link(cx)
        }))
    }
}

pub(crate) struct RecordingScroll(Log);

impl ScrollHook for RecordingScroll {
    fn scroll_into_view(&self, _document: &Document, node: NodeId) {
        self.0.push(Event::Scrolled(node));
    }
}

/// Animator that mounts immediately and holds leave completions until [`finish_all`](Self::finish_all).
#[derive(Default)]
pub(crate) struct RecordingAnimator {
    entered: Cell<usize>,
    pending: RefCell<Vec<LeaveDone>>,
}

impl RecordingAnimator {
    pub(crate) fn entered(&self) -> usize {
        self.entered.get()
    }

    pub(crate) fn finish_all(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        let n = pending.len();
        for done in pending {
            done.finish();
        }
        n
    }
}

impl Animate for RecordingAnimator {
    fn enter(&self, document: &Document, content: NodeId, anchor: NodeId) -> Result<(), ViewError> {
        document.tree_mut().insert_after(content, anchor)?;
        self.entered.set(self.entered.get() + 1);
        Ok(())
    }

    fn leave(&self, _document: &Document, _content: NodeId, done: LeaveDone) {
        self.pending.borrow_mut().push(done);
    }
}

impl LegacyAnimate for RecordingAnimator {
    fn enter(&self, document: &Document, content: NodeId, parent: NodeId) -> Result<(), ViewError> {
        document.tree_mut().append(content, parent)?;
        self.entered.set(self.entered.get() + 1);
        Ok(())
    }

    fn leave(&self, _document: &Document, _content: NodeId, done: LeaveDone) {
        self.pending.borrow_mut().push(done);
    }
}

/// Controller built by the fixture's registry.
#[derive(Debug)]
pub(crate) struct MadeController {
    pub(crate) name: String,
    pub(crate) scope: ScopeId,
    pub(crate) extra: BTreeMap<String, Value>,
}

/// Registry with `UsersCtrl`, which records what it was built with, and
/// `BrokenCtrl`, whose constructor always fails.
fn controllers() -> ControllerRegistry {
    ControllerRegistry::new()
        .register("UsersCtrl", |scope, locals| {
            Ok(Rc::new(MadeController {
                name: "UsersCtrl".into(),
                scope,
                extra: locals.extra.clone(),
            }))
        })
        .register("BrokenCtrl", |_scope, _locals| {
            Err(ViewError::Controller {
                controller: "BrokenCtrl".into(),
                reason: "constructor failed".into(),
            })
        })
}

/// `<body><ui-view>{initial}</ui-view><footer/></body>` with a root context and recording collaborators.
pub(crate) struct Fixture {
    pub(crate) doc: Document,
    pub(crate) scopes: Scopes,
    pub(crate) root: ScopeId,
    pub(crate) body: NodeId,
    pub(crate) origin: NodeId,
    pub(crate) router: Rc<ActiveStateRouter>,
    pub(crate) env: Rc<ViewEnv>,
    pub(crate) log: Log,
    pub(crate) animator: Rc<RecordingAnimator>,
}

impl Fixture {
    pub(crate) fn new(initial: &str) -> Self {
        Self::build(initial, false)
    }

    pub(crate) fn with_animation(initial: &str) -> Self {
        Self::build(initial, true)
    }

    fn build(initial: &str, animate: bool) -> Self {
        let mut tree = Tree::new();
        let body = tree.insert(
            None,
            LocalNode {
                kind: NodeKind::element("body"),
                ..Default::default()
            },
        );
        let origin = tree.insert(
            Some(body),
            LocalNode {
                kind: NodeKind::element("ui-view"),
                markup: initial.into(),
                ..Default::default()
            },
        );
        tree.insert(
            Some(body),
            LocalNode {
                kind: NodeKind::element("footer"),
                ..Default::default()
            },
        );
        let doc = Document::from_tree(tree);
        let scopes = Scopes::new();
        let root = scopes.new_root();
        let router = Rc::new(ActiveStateRouter::new());
        let log = Log::default();
        let animator = Rc::new(RecordingAnimator::default());

        let mut env = ViewEnv::new(
            doc.clone(),
            scopes.clone(),
            router.clone(),
            Rc::new(RecordingCompiler { log: log.clone() }),
        )
        .with_controllers(Rc::new(controllers()))
        .with_scroll(Rc::new(RecordingScroll(log.clone())));
        if animate {
            env = env.with_animation(&CapabilityProbe {
                animate: Some(animator.clone()),
                legacy: None,
            });
        }
        Self {
            doc,
            scopes,
            root,
            body,
            origin,
            router,
            env: Rc::new(env),
            log,
            animator,
        }
    }

    /// Transition to `state`, filling the given views.
    pub(crate) fn show<'a>(
        &self,
        state: &str,
        views: impl IntoIterator<Item = (&'a str, ResolvedLocals)>,
    ) -> Rc<ActiveState> {
        let state = views
            .into_iter()
            .fold(ActiveState::new(StateNode::new(state)), |s, (name, locals)| {
                s.with_view(name, locals)
            });
        self.router.transition_to(state)
    }

    /// Transition to `state`, filling `view` with shared locals.
    pub(crate) fn show_shared(
        &self,
        state: &str,
        view: &str,
        locals: Rc<ResolvedLocals>,
    ) -> Rc<ActiveState> {
        self.router
            .transition_to(ActiveState::new(StateNode::new(state)).with_shared_view(view, locals))
    }

    pub(crate) fn link_root(&self, config: PlaceholderConfig) -> Result<Placeholder, ViewError> {
        self.link_in(self.root, config)
    }

    pub(crate) fn link_in(
        &self,
        scope: ScopeId,
        config: PlaceholderConfig,
    ) -> Result<Placeholder, ViewError> {
        Placeholder::link(&self.env, scope, self.origin, None, config)
    }

    /// Broadcast a successful state change from the root context.
    pub(crate) fn trigger(&self) -> Result<(), ViewError> {
        self.scopes
            .broadcast(self.root, Notification::StateChangeSuccess)
    }
}
