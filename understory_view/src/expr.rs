// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expression evaluation for on-load and autoscroll hooks.
//!
//! The placeholder only needs truthiness back, so the contract is narrow:
//! [`Evaluate::evaluate`] returns a `bool`. Hosts with a real expression language
//! implement [`Evaluate`] themselves; [`ScopeEvaluator`] covers the common cases
//! against [`Scopes`] locals.
//!
//! Supported by [`ScopeEvaluator`]:
//! - JSON literals (`true`, `0`, `"text"`, `null`) and single-quoted strings,
//! - dotted lookups through the scope chain (`user.profile.visible`),
//! - prefix negation (`!busy`),
//! - assignment of a literal or lookup to a local (`loaded = true`).
//!
//! Truthiness: `null`, `false`, `0`, and `""` are false; everything else is true.
//! Missing names and blank expressions evaluate to `null`.

use serde_json::Value;

use crate::error::ViewError;
use crate::scope::{ScopeId, Scopes};

/// Evaluates an expression against a binding context.
pub trait Evaluate {
    /// Evaluate `expression` in `scope` and return its truthiness.
    fn evaluate(&self, scope: ScopeId, expression: &str) -> Result<bool, ViewError>;
}

/// Default evaluator over [`Scopes`] locals.
#[derive(Clone, Debug)]
pub struct ScopeEvaluator {
    scopes: Scopes,
}

impl ScopeEvaluator {
    /// Evaluate against `scopes`.
    pub fn new(scopes: Scopes) -> Self {
        Self { scopes }
    }

    fn value_of(&self, scope: ScopeId, text: &str) -> Result<Value, String> {
        if text.is_empty() {
            return Err("empty operand".into());
        }
        if let Ok(v) = serde_json::from_str::<Value>(text) {
            return Ok(v);
        }
        if let Some(s) = text
            .strip_prefix('\'')
            .and_then(|t| t.strip_suffix('\''))
        {
            return Ok(Value::String(s.to_owned()));
        }
        let mut segments = text.split('.');
        let head = segments.next().unwrap_or_default();
        if !is_identifier(head) {
            return Err(format!("unsupported syntax near '{text}'"));
        }
        let mut value = self.scopes.lookup(scope, head).unwrap_or(Value::Null);
        for seg in segments {
            if !is_identifier(seg) {
                return Err(format!("invalid member '{seg}'"));
            }
            value = value.get(seg).cloned().unwrap_or(Value::Null);
        }
        Ok(value)
    }

    fn eval_str(&self, scope: ScopeId, expr: &str) -> Result<Value, String> {
        let expr = expr.trim();
        if let Some(rest) = expr.strip_prefix('!') {
            return Ok(Value::Bool(!truthy(&self.eval_str(scope, rest)?)));
        }
        if expr.contains("==") {
            return Err("comparison operators are not supported".into());
        }
        if let Some((lhs, rhs)) = expr.split_once('=') {
            let lhs = lhs.trim();
            if !is_identifier(lhs) {
                return Err(format!("cannot assign to '{lhs}'"));
            }
            let value = self.eval_str(scope, rhs)?;
            self.scopes
                .set_local(scope, lhs, value.clone())
                .map_err(|e| e.to_string())?;
            return Ok(value);
        }
        self.value_of(scope, expr)
    }
}

impl Evaluate for ScopeEvaluator {
    fn evaluate(&self, scope: ScopeId, expression: &str) -> Result<bool, ViewError> {
        if expression.trim().is_empty() {
            return Ok(false);
        }
        self.eval_str(scope, expression)
            .map(|v| truthy(&v))
            .map_err(|reason| ViewError::Expression {
                expression: expression.to_owned(),
                reason,
            })
    }
}

/// Truthiness of a JSON value.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
