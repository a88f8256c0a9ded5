// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer strategies: how content enters and leaves the document.
//!
//! ## Capability
//!
//! Animation is an optional capability resolved once, when the [`Renderer`] is
//! built from a [`CapabilityProbe`]. The preferred [`Animate`] capability wins over
//! the [`LegacyAnimate`] fallback; with neither, every strategy is static.
//! A missing capability is not an error.
//!
//! ## Strategies
//!
//! | capability | `should_animate` | enter | leave |
//! | --- | --- | --- | --- |
//! | none | any | insert after anchor | remove now |
//! | any | `false` | insert after anchor | remove now |
//! | `Animate` | `true` | delegated | delegated, removal on completion |
//! | `LegacyAnimate` | `true` | delegated (appends to parent) | delegated, removal on completion |
//!
//! Content handed to an animated leave is flagged [`NodeFlags::LEAVING`] until the
//! animator reports completion through [`LeaveDone::finish`].

use std::fmt;
use std::rc::Rc;

use tracing::trace;
use understory_doc_tree::{NodeFlags, NodeId};

use crate::document::Document;
use crate::error::ViewError;

/// Completion callback for an animated leave. Calling [`LeaveDone::finish`] removes the content.
pub struct LeaveDone(Box<dyn FnOnce()>);

impl LeaveDone {
    /// Report that the leave animation finished.
    pub fn finish(self) {
        (self.0)();
    }
}

impl fmt::Debug for LeaveDone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LeaveDone")
    }
}

/// Preferred animation capability.
pub trait Animate {
    /// Insert `content` right after `anchor`, animating its arrival.
    fn enter(&self, document: &Document, content: NodeId, anchor: NodeId) -> Result<(), ViewError>;
    /// Animate `content` out and call `done` when finished.
    fn leave(&self, document: &Document, content: NodeId, done: LeaveDone);
}

/// Legacy animation capability, which only knows the parent node.
pub trait LegacyAnimate {
    /// Append `content` to `parent`, animating its arrival.
    fn enter(&self, document: &Document, content: NodeId, parent: NodeId) -> Result<(), ViewError>;
    /// Animate `content` out and call `done` when finished.
    fn leave(&self, document: &Document, content: NodeId, done: LeaveDone);
}

/// A resolved animation capability.
#[derive(Clone)]
pub enum AnimationCapability {
    /// The preferred capability.
    Animate(Rc<dyn Animate>),
    /// The legacy fallback.
    Legacy(Rc<dyn LegacyAnimate>),
}

impl fmt::Debug for AnimationCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Animate(_) => f.write_str("Animate"),
            Self::Legacy(_) => f.write_str("Legacy"),
        }
    }
}

/// Animation services a host may provide. Either, both, or neither may be set.
#[derive(Clone, Default)]
pub struct CapabilityProbe {
    /// Preferred capability.
    pub animate: Option<Rc<dyn Animate>>,
    /// Legacy fallback.
    pub legacy: Option<Rc<dyn LegacyAnimate>>,
}

impl fmt::Debug for CapabilityProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityProbe")
            .field("animate", &self.animate.is_some())
            .field("legacy", &self.legacy.is_some())
            .finish()
    }
}

impl CapabilityProbe {
    /// Pick the capability to use, preferring [`Animate`].
    pub fn resolve(&self) -> Option<AnimationCapability> {
        self.animate
            .clone()
            .map(AnimationCapability::Animate)
            .or_else(|| self.legacy.clone().map(AnimationCapability::Legacy))
    }
}

/// Factory for per-call [`RendererStrategy`] values.
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    capability: Option<AnimationCapability>,
}

impl Renderer {
    /// Probe `probe` once and remember the outcome.
    pub fn new(probe: &CapabilityProbe) -> Self {
        Self {
            capability: probe.resolve(),
        }
    }

    /// A renderer with no animation capability.
    pub fn static_only() -> Self {
        Self::default()
    }

    /// The capability chosen at construction.
    pub fn capability(&self) -> Option<&AnimationCapability> {
        self.capability.as_ref()
    }

    /// Strategy for one enter or leave.
    pub fn strategy(&self, should_animate: bool) -> RendererStrategy {
        match (&self.capability, should_animate) {
            (Some(AnimationCapability::Animate(a)), true) => RendererStrategy::Animated(a.clone()),
            (Some(AnimationCapability::Legacy(l)), true) => RendererStrategy::Legacy(l.clone()),
            _ => RendererStrategy::Static,
        }
    }
}

/// A pair of mount and unmount operations.
#[derive(Clone)]
pub enum RendererStrategy {
    /// Immediate insertion and removal.
    Static,
    /// Delegates to the preferred capability.
    Animated(Rc<dyn Animate>),
    /// Delegates to the legacy capability.
    Legacy(Rc<dyn LegacyAnimate>),
}

impl fmt::Debug for RendererStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("Static"),
            Self::Animated(_) => f.write_str("Animated"),
            Self::Legacy(_) => f.write_str("Legacy"),
        }
    }
}

impl RendererStrategy {
    /// Returns true for [`RendererStrategy::Static`].
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static)
    }

    /// Mount `content` next to `anchor` (or into `parent` for the legacy capability).
    pub fn enter(
        &self,
        document: &Document,
        content: NodeId,
        parent: NodeId,
        anchor: NodeId,
    ) -> Result<(), ViewError> {
        trace!(strategy = ?self, ?content, "enter");
        match self {
            Self::Static => document.tree_mut().insert_after(content, anchor)?,
            Self::Animated(a) => a.enter(document, content, anchor)?,
            Self::Legacy(l) => l.enter(document, content, parent)?,
        }
        Ok(())
    }

    /// Unmount `content`.
    pub fn leave(&self, document: &Document, content: NodeId) {
        trace!(strategy = ?self, ?content, "leave");
        match self {
            Self::Static => document.tree_mut().remove(content),
            Self::Animated(a) => a.leave(document, content, mark_leaving(document, content)),
            Self::Legacy(l) => l.leave(document, content, mark_leaving(document, content)),
        }
    }
}

fn mark_leaving(document: &Document, content: NodeId) -> LeaveDone {
    {
        let mut tree = document.tree_mut();
        if let Some(flags) = tree.flags(content) {
            tree.set_flags(content, flags | NodeFlags::LEAVING);
        }
    }
    let document = document.clone();
    LeaveDone(Box::new(move || document.tree_mut().remove(content)))
}
