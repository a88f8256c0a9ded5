// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nested views driven by state transitions.
//!
//! A top-level view shows a users layout that declares a nested `detail` view.
//! Moving between `users` and `users.detail` keeps the layout mounted (its locals
//! are shared) and only swaps the nested view. Moving to `home` tears both down.
//!
//! Run:
//! - `cargo run -p understory_demos --example nested_views`
//! - `RUST_LOG=understory_view=trace cargo run -p understory_demos --example nested_views`

use std::rc::Rc;

use serde_json::json;
use understory_doc_tree::{LocalNode, NodeId, NodeKind, Tree};
use understory_view::compile::ViewMarkupCompiler;
use understory_view::document::Document;
use understory_view::host::{ControllerRegistry, ScrollHook, ViewEnv};
use understory_view::placeholder::{Placeholder, PlaceholderConfig};
use understory_view::scope::Scopes;
use understory_view::state::{ActiveState, ActiveStateRouter};
use understory_view::types::{Notification, ResolvedLocals, StateNode};

struct PrintScroll;

impl ScrollHook for PrintScroll {
    fn scroll_into_view(&self, document: &Document, node: NodeId) {
        let tree = document.tree();
        tracing::info!(markup = tree.markup(node).unwrap_or_default(), "scroll into view");
    }
}

fn dump(doc: &Document, node: NodeId, depth: usize) {
    let tree = doc.tree();
    let Some(local) = tree.local(node) else {
        return;
    };
    let label = match &local.kind {
        NodeKind::Element(tag) => format!("<{tag}> {}", local.markup),
        NodeKind::Comment(text) => format!("<!--{text}-->"),
    };
    println!("{:indent$}{label}", "", indent = depth * 2);
    let children = tree.children(node).to_vec();
    drop(tree);
    for child in children {
        dump(doc, child, depth + 1);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

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
            markup: "<p>loading</p>".into(),
            ..Default::default()
        },
    );
    let doc = Document::from_tree(tree);
    let scopes = Scopes::new();
    let root = scopes.new_root();
    let router = Rc::new(ActiveStateRouter::new());

    let controllers = ControllerRegistry::new().register("UserDetail", |_scope, locals| {
        let user = locals.extra.get("user").cloned().unwrap_or_default();
        tracing::info!(%user, "user detail controller created");
        Ok(Rc::new(user))
    });
    let env = Rc::new(
        ViewEnv::new(
            doc.clone(),
            scopes.clone(),
            router.clone(),
            Rc::new(ViewMarkupCompiler),
        )
        .with_controllers(Rc::new(controllers))
        .with_scroll(Rc::new(PrintScroll)),
    );

    let config: PlaceholderConfig = serde_json::from_value(json!({ "autoscroll": "true" }))?;
    let _top = Placeholder::link(&env, root, origin, None, config)?;
    println!("-- initial");
    dump(&doc, body, 0);

    let users = StateNode::new("users");
    let detail = StateNode::new("users.detail");
    let home = StateNode::new("home");
    let layout = Rc::new(ResolvedLocals::new(users.clone()).with_template(
        r#"<h1>Users</h1><ui-view name="detail" autoscroll="false"><p>pick a user</p></ui-view>"#,
    ));

    router.transition_to(ActiveState::new(users).with_shared_view("@", layout.clone()));
    scopes.broadcast(root, Notification::StateChangeSuccess)?;
    println!("-- users");
    dump(&doc, body, 0);

    router.transition_to(
        ActiveState::new(detail.clone())
            .with_shared_view("@", layout)
            .with_view(
                "detail@users",
                ResolvedLocals::new(detail)
                    .with_template("<p>Ada Lovelace</p>")
                    .with_controller("UserDetail")
                    .with_extra("user", json!("ada")),
            ),
    );
    scopes.broadcast(root, Notification::StateChangeSuccess)?;
    println!("-- users.detail");
    dump(&doc, body, 0);

    router.transition_to(
        ActiveState::new(home.clone())
            .with_view("@", ResolvedLocals::new(home).with_template("<p>welcome</p>")),
    );
    scopes.broadcast(root, Notification::StateChangeSuccess)?;
    println!("-- home");
    dump(&doc, body, 0);
    println!("live binding contexts: {}", scopes.len());

    Ok(())
}
