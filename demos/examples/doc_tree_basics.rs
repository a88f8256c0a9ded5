// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document tree basics.
//!
//! Build a small tree, swap a node for a marker, mount a clone next to it, and
//! read back the mutation log.
//!
//! Run:
//! - `cargo run -p understory_demos --example doc_tree_basics`

use understory_doc_tree::{LocalNode, NodeFlags, NodeKind, Tree};

fn main() {
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
            kind: NodeKind::element("section"),
            markup: "<p>fallback</p>".into(),
            ..Default::default()
        },
    );
    let _initial = tree.commit();

    // Swap the origin for a marker comment; the origin stays alive, detached.
    let marker = tree.insert(
        None,
        LocalNode {
            kind: NodeKind::comment(" marker "),
            flags: NodeFlags::ANCHOR,
            ..Default::default()
        },
    );
    tree.replace_with(origin, marker).unwrap();

    // Mount a copy of the origin right after the marker.
    let copy = tree.clone_shallow(origin).unwrap();
    tree.set_markup(copy, "<p>hello</p>").unwrap();
    tree.insert_after(copy, marker).unwrap();
    tree.set_data(copy, "owner", "home").unwrap();

    let mutations = tree.commit();
    println!("attached: {:?}", mutations.attached);
    println!("detached: {:?}", mutations.detached);
    println!("updated:  {:?}", mutations.updated);

    assert_eq!(tree.children(body), &[marker, copy]);
    assert_eq!(tree.parent(origin), None);
    assert_eq!(tree.inherited_data(copy, "owner"), Some("home"));
}
