// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A markup compiler that discovers nested `<ui-view>` declarations.
//!
//! [`ViewMarkupCompiler`] is the smallest [`ContentCompiler`] that supports
//! nesting. It scans the markup of mounted content for top-level `<ui-view>`
//! elements, creates one origin node per declaration under the content (its
//! markup is the declaration's fallback), and returns a linker that links a
//! placeholder on each of them. Declarations nested inside another declaration's
//! fallback are left alone until that fallback is rendered.
//!
//! Attributes map onto [`PlaceholderConfig`]: `ui-view` or `name` for the declared
//! name (`ui-view` wins when both are set), plus `onload` and `autoscroll`.
//! Other attributes are ignored.
//!
//! ```
//! use understory_view::compile::scan_views;
//!
//! let views = scan_views(
//!     r#"<nav/><ui-view name="main" autoscroll="false">loading</ui-view><ui-view ui-view="side"/>"#,
//! )
//! .unwrap();
//! assert_eq!(views.len(), 2);
//! assert_eq!(views[0].config.name, "main");
//! assert_eq!(views[0].config.autoscroll.as_deref(), Some("false"));
//! assert_eq!(views[0].fallback, "loading");
//! assert_eq!(views[1].config.name, "side");
//! ```

use serde_json::{Map, Value};
use understory_doc_tree::{LocalNode, NodeId, NodeKind, TreeError};

use crate::document::Document;
use crate::error::ViewError;
use crate::host::{ContentCompiler, Linker};
use crate::placeholder::PlaceholderConfig;

/// Tag of placeholder origin nodes created by [`ViewMarkupCompiler`].
pub const VIEW_TAG: &str = "ui-view";

const OPEN: &str = "<ui-view";
const CLOSE: &str = "</ui-view>";

/// A `<ui-view>` declaration found in markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclaredView {
    /// Configuration read from the declaration's attributes.
    pub config: PlaceholderConfig,
    /// Inner markup, used as fallback content.
    pub fallback: String,
}

/// Find the top-level `<ui-view>` declarations in `markup`.
pub fn scan_views(markup: &str) -> Result<Vec<DeclaredView>, String> {
    let mut views = Vec::new();
    let mut rest = markup;
    while let Some(start) = find_open(rest) {
        let tag = &rest[start + OPEN.len()..];
        let end = tag_end(tag).ok_or("unterminated <ui-view> tag")?;
        let (attrs, self_closing) = split_self_closing(&tag[..end]);
        let config = parse_config(attrs)?;
        let body = &tag[end + 1..];
        if self_closing {
            views.push(DeclaredView {
                config,
                fallback: String::new(),
            });
            rest = body;
            continue;
        }
        let close = find_close(body)?;
        views.push(DeclaredView {
            config,
            fallback: body[..close].to_owned(),
        });
        rest = &body[close + CLOSE.len()..];
    }
    Ok(views)
}

/// Compiles content by linking a placeholder on every top-level `<ui-view>` it declares.
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewMarkupCompiler;

impl ContentCompiler for ViewMarkupCompiler {
    fn compile(&self, document: &Document, content: NodeId) -> Result<Linker, ViewError> {
        let markup = document
            .tree()
            .markup(content)
            .ok_or(TreeError::StaleNode(content))?
            .to_owned();
        let views = scan_views(&markup).map_err(|reason| ViewError::Compile {
            node: content,
            reason,
        })?;
        let origins: Vec<(NodeId, PlaceholderConfig)> = {
            let mut tree = document.tree_mut();
            views
                .into_iter()
                .map(|view| {
                    let origin = tree.insert(
                        Some(content),
                        LocalNode {
                            kind: NodeKind::element(VIEW_TAG),
                            markup: view.fallback,
                            ..Default::default()
                        },
                    );
                    (origin, view.config)
                })
                .collect()
        };
        Ok(Box::new(move |cx| {
            for (origin, config) in origins {
                cx.link_placeholder(origin, config)?;
            }
            Ok(())
        }))
    }
}

fn find_open(s: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = s[from..].find(OPEN) {
        let at = from + i;
        match s[at + OPEN.len()..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => return Some(at),
            _ => from = at + OPEN.len(),
        }
    }
    None
}

// Index of the `>` closing a start tag, skipping quoted attribute values.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn split_self_closing(attrs: &str) -> (&str, bool) {
    match attrs.trim_end().strip_suffix('/') {
        Some(attrs) => (attrs, true),
        None => (attrs, false),
    }
}

// Offset of the `</ui-view>` matching an already consumed start tag.
fn find_close(body: &str) -> Result<usize, String> {
    let mut depth = 0_usize;
    let mut pos = 0;
    loop {
        let close = body[pos..]
            .find(CLOSE)
            .map(|i| pos + i)
            .ok_or("missing </ui-view>")?;
        match find_open(&body[pos..]).map(|i| pos + i) {
            Some(open) if open < close => {
                let tag = &body[open + OPEN.len()..];
                let end = tag_end(tag).ok_or("unterminated <ui-view> tag")?;
                if !split_self_closing(&tag[..end]).1 {
                    depth += 1;
                }
                pos = open + OPEN.len() + end + 1;
            }
            _ => {
                if depth == 0 {
                    return Ok(close);
                }
                depth -= 1;
                pos = close + CLOSE.len();
            }
        }
    }
}

fn parse_attributes(src: &str) -> Result<Vec<(&str, &str)>, String> {
    let mut out = Vec::new();
    let mut rest = src.trim_start();
    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        if key.is_empty() {
            return Err(format!("malformed attribute near '{rest}'"));
        }
        rest = rest[key_end..].trim_start();
        let mut value = "";
        if let Some(after) = rest.strip_prefix('=') {
            let after = after.trim_start();
            let (v, tail) = match after.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let inner = &after[1..];
                    let close = inner
                        .find(q)
                        .ok_or_else(|| format!("unterminated value for '{key}'"))?;
                    (&inner[..close], &inner[close + 1..])
                }
                _ => after.split_at(after.find(char::is_whitespace).unwrap_or(after.len())),
            };
            value = v;
            rest = tail;
        }
        out.push((key, value));
        rest = rest.trim_start();
    }
    Ok(out)
}

fn parse_config(attrs: &str) -> Result<PlaceholderConfig, String> {
    let mut map: Map<String, Value> = parse_attributes(attrs)?
        .into_iter()
        .map(|(k, v)| (k.to_owned(), Value::String(v.to_owned())))
        .collect();
    let directive = map
        .remove(VIEW_TAG)
        .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()));
    if let Some(name) = directive.or_else(|| map.remove("name")) {
        map.insert("name".into(), name);
    }
    serde_json::from_value(Value::Object(map)).map_err(|e| e.to_string())
}
