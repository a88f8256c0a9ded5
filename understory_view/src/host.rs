// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host collaborators and the environment that bundles them.
//!
//! ## Collaborators
//!
//! Placeholders consume their host through narrow traits:
//! - [`StateRouter`]: locals for a view name under the active state.
//! - [`ContentCompiler`]: turns mounted content into a [`Linker`] that binds it to a context.
//! - [`ControllerFactory`]: instantiates the controller named by resolved locals.
//! - [`ScrollHook`]: brings freshly mounted content into view.
//! - [`Evaluate`]: evaluates on-load and autoscroll expressions.
//!
//! Animation is not a trait object on the environment. It is resolved once into a
//! [`Renderer`] from a [`CapabilityProbe`].
//!
//! ## Environment
//!
//! A [`ViewEnv`] is shared by every placeholder of one tree, nested ones included.
//! It also owns the [`ReentrancyGuard`] that keeps one trigger from starting a
//! second update pass while the first is still cascading.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use understory_doc_tree::NodeId;

use crate::document::Document;
use crate::error::ViewError;
use crate::expr::{Evaluate, ScopeEvaluator};
use crate::placeholder::{Placeholder, PlaceholderConfig};
use crate::renderer::{CapabilityProbe, Renderer};
use crate::scope::{ScopeId, Scopes};
use crate::state::StateRouter;
use crate::types::{ControllerHandle, ControllerRef, ResolvedLocals};
use crate::wiring::ReentrancyGuard;

/// Binds compiled content to a binding context. Produced by [`ContentCompiler::compile`].
pub type Linker = Box<dyn FnOnce(&LinkContext<'_>) -> Result<(), ViewError>>;

/// What a [`Linker`] binds against.
#[derive(Clone, Copy, Debug)]
pub struct LinkContext<'a> {
    /// Environment of the placeholder that mounted the content.
    pub env: &'a Rc<ViewEnv>,
    /// Binding context created for the content.
    pub scope: ScopeId,
    /// The mounted content node.
    pub content: NodeId,
    /// Parent to hand to placeholders nested in the content.
    pub parent: Option<&'a Placeholder>,
}

impl LinkContext<'_> {
    /// Link a placeholder declared inside the content, with `origin` as its origin node.
    pub fn link_placeholder(
        &self,
        origin: NodeId,
        config: PlaceholderConfig,
    ) -> Result<Placeholder, ViewError> {
        Placeholder::link(self.env, self.scope, origin, self.parent, config)
    }
}

/// Compiles mounted content.
pub trait ContentCompiler {
    /// Prepare `content` for linking. Structural errors surface here, binding errors from the [`Linker`].
    fn compile(&self, document: &Document, content: NodeId) -> Result<Linker, ViewError>;
}

/// Instantiates controllers for resolved content.
pub trait ControllerFactory {
    /// Build `controller` against the new binding context `scope`.
    fn instantiate(
        &self,
        controller: &ControllerRef,
        scope: ScopeId,
        locals: &ResolvedLocals,
    ) -> Result<ControllerHandle, ViewError>;
}

/// A factory that knows no controllers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoControllers;

impl ControllerFactory for NoControllers {
    fn instantiate(
        &self,
        controller: &ControllerRef,
        _scope: ScopeId,
        _locals: &ResolvedLocals,
    ) -> Result<ControllerHandle, ViewError> {
        Err(ViewError::UnknownController(controller.clone()))
    }
}

type Constructor = Box<dyn Fn(ScopeId, &ResolvedLocals) -> Result<ControllerHandle, ViewError>>;

/// Controllers registered by name.
///
/// ```
/// use std::rc::Rc;
/// use understory_view::host::{ControllerFactory, ControllerRegistry};
/// use understory_view::scope::Scopes;
/// use understory_view::types::{ControllerRef, ResolvedLocals, StateNode};
///
/// let registry = ControllerRegistry::new()
///     .register("Counter", |_scope, _locals| Ok(Rc::new(0_u32)));
/// let scope = Scopes::new().new_root();
/// let locals = ResolvedLocals::new(StateNode::new("home"));
///
/// let handle = registry.instantiate(&"Counter".into(), scope, &locals).unwrap();
/// assert_eq!(handle.downcast_ref::<u32>(), Some(&0));
/// assert!(registry.instantiate(&ControllerRef::new("Nope"), scope, &locals).is_err());
/// ```
#[derive(Default)]
pub struct ControllerRegistry {
    constructors: HashMap<ControllerRef, Constructor>,
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("ControllerRegistry")
            .field("controllers", &names)
            .finish()
    }
}

impl ControllerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `constructor` under `name`, replacing any previous one.
    pub fn register(
        mut self,
        name: impl Into<ControllerRef>,
        constructor: impl Fn(ScopeId, &ResolvedLocals) -> Result<ControllerHandle, ViewError> + 'static,
    ) -> Self {
        self.constructors.insert(name.into(), Box::new(constructor));
        self
    }
}

impl ControllerFactory for ControllerRegistry {
    fn instantiate(
        &self,
        controller: &ControllerRef,
        scope: ScopeId,
        locals: &ResolvedLocals,
    ) -> Result<ControllerHandle, ViewError> {
        let constructor = self
            .constructors
            .get(controller)
            .ok_or_else(|| ViewError::UnknownController(controller.clone()))?;
        constructor(scope, locals)
    }
}

/// Brings mounted content into view.
pub trait ScrollHook {
    /// Scroll so that `node` is visible.
    fn scroll_into_view(&self, document: &Document, node: NodeId);
}

/// A scroll hook that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoScroll;

impl ScrollHook for NoScroll {
    fn scroll_into_view(&self, _document: &Document, _node: NodeId) {}
}

/// Collaborators shared by every placeholder of one tree.
///
/// Only the document, scopes, router, and compiler are required. Controllers
/// default to [`NoControllers`], scrolling to [`NoScroll`], evaluation to a
/// [`ScopeEvaluator`] over the same scopes, and rendering to static.
pub struct ViewEnv {
    document: Document,
    scopes: Scopes,
    router: Rc<dyn StateRouter>,
    compiler: Rc<dyn ContentCompiler>,
    controllers: Rc<dyn ControllerFactory>,
    scroll: Rc<dyn ScrollHook>,
    evaluator: Rc<dyn Evaluate>,
    renderer: Renderer,
    guard: ReentrancyGuard,
}

impl fmt::Debug for ViewEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewEnv")
            .field("scopes", &self.scopes)
            .field("renderer", &self.renderer)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl ViewEnv {
    /// Environment with default controllers, scrolling, evaluation, and static rendering.
    pub fn new(
        document: Document,
        scopes: Scopes,
        router: Rc<dyn StateRouter>,
        compiler: Rc<dyn ContentCompiler>,
    ) -> Self {
        let evaluator = Rc::new(ScopeEvaluator::new(scopes.clone()));
        Self {
            document,
            scopes,
            router,
            compiler,
            controllers: Rc::new(NoControllers),
            scroll: Rc::new(NoScroll),
            evaluator,
            renderer: Renderer::static_only(),
            guard: ReentrancyGuard::new(),
        }
    }

    /// Use `controllers` to instantiate controllers.
    pub fn with_controllers(mut self, controllers: Rc<dyn ControllerFactory>) -> Self {
        self.controllers = controllers;
        self
    }

    /// Use `scroll` after resolved content mounts.
    pub fn with_scroll(mut self, scroll: Rc<dyn ScrollHook>) -> Self {
        self.scroll = scroll;
        self
    }

    /// Use `evaluator` for on-load and autoscroll expressions.
    pub fn with_evaluator(mut self, evaluator: Rc<dyn Evaluate>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Resolve the animation capability from `probe`, once.
    pub fn with_animation(mut self, probe: &CapabilityProbe) -> Self {
        self.renderer = Renderer::new(probe);
        self
    }

    /// The shared document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The binding-context hierarchy.
    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    /// The state router.
    pub fn router(&self) -> &dyn StateRouter {
        &*self.router
    }

    /// The content compiler.
    pub fn compiler(&self) -> &dyn ContentCompiler {
        &*self.compiler
    }

    /// The controller factory.
    pub fn controllers(&self) -> &dyn ControllerFactory {
        &*self.controllers
    }

    /// The scroll hook.
    pub fn scroll(&self) -> &dyn ScrollHook {
        &*self.scroll
    }

    /// The expression evaluator.
    pub fn evaluator(&self) -> &dyn Evaluate {
        &*self.evaluator
    }

    /// The renderer strategy factory.
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// The reentrancy guard shared by all placeholders of this tree.
    pub fn guard(&self) -> &ReentrancyGuard {
        &self.guard
    }
}
