// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by every fallible view operation.

use thiserror::Error;
use understory_doc_tree::{NodeId, TreeError};

use crate::scope::ScopeId;
use crate::types::{ControllerRef, ViewName};

/// Failures surfaced by placeholders and their collaborators.
///
/// None of these are retried or recovered inside the crate; they propagate to
/// whoever triggered the update.
#[derive(Debug, Error)]
pub enum ViewError {
    /// A structural document operation failed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The content compiler rejected a fragment.
    #[error("failed to compile content {node:?}: {reason}")]
    Compile {
        /// Content node being compiled.
        node: NodeId,
        /// Compiler-provided detail.
        reason: String,
    },

    /// Binding compiled content to its context failed.
    #[error("failed to link content {node:?}: {reason}")]
    Link {
        /// Content node being linked.
        node: NodeId,
        /// Linker-provided detail.
        reason: String,
    },

    /// A controller constructor failed.
    #[error("controller '{controller}' failed: {reason}")]
    Controller {
        /// Controller that was being instantiated.
        controller: ControllerRef,
        /// Constructor-provided detail.
        reason: String,
    },

    /// No constructor is known for the requested controller.
    #[error("no controller registered as '{0}'")]
    UnknownController(ControllerRef),

    /// An on-load or autoscroll expression could not be evaluated.
    #[error("cannot evaluate '{expression}': {reason}")]
    Expression {
        /// The offending expression.
        expression: String,
        /// Evaluator-provided detail.
        reason: String,
    },

    /// The binding context was destroyed (or never existed).
    #[error("binding context {0:?} is not alive")]
    DeadScope(ScopeId),

    /// The view has no parent node, so there is nowhere to mount content.
    #[error("view '{view}' has no parent node to render into")]
    NoParent {
        /// View being rendered.
        view: ViewName,
    },
}
