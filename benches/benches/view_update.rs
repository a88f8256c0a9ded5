// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_doc_tree::{LocalNode, NodeKind, Tree};
use understory_view::compile::ViewMarkupCompiler;
use understory_view::document::Document;
use understory_view::host::ViewEnv;
use understory_view::placeholder::{Placeholder, PlaceholderConfig};
use understory_view::scope::{ScopeId, Scopes};
use understory_view::state::{ActiveState, ActiveStateRouter};
use understory_view::types::{Notification, ResolvedLocals, StateNode};

struct Setup {
    scopes: Scopes,
    root: ScopeId,
    router: Rc<ActiveStateRouter>,
    view: Placeholder,
}

// `n` sibling views named `v0..vn` under one body.
fn setup(n: usize) -> Setup {
    let mut tree = Tree::new();
    let body = tree.insert(None, LocalNode::default());
    let origins: Vec<_> = (0..n)
        .map(|_| {
            tree.insert(
                Some(body),
                LocalNode {
                    kind: NodeKind::element("ui-view"),
                    markup: "fallback".into(),
                    ..Default::default()
                },
            )
        })
        .collect();
    let doc = Document::from_tree(tree);
    let scopes = Scopes::new();
    let root = scopes.new_root();
    let router = Rc::new(ActiveStateRouter::new());
    let env = Rc::new(ViewEnv::new(
        doc,
        scopes.clone(),
        router.clone(),
        Rc::new(ViewMarkupCompiler),
    ));
    let mut views = origins.into_iter().enumerate().map(|(i, origin)| {
        Placeholder::link(&env, root, origin, None, PlaceholderConfig::named(format!("v{i}")))
            .expect("link view")
    });
    let view = views.next().expect("at least one view");
    views.for_each(drop);
    Setup {
        scopes,
        root,
        router,
        view,
    }
}

fn show(router: &ActiveStateRouter, state: &str, n: usize) {
    let node = StateNode::new(state);
    let active = (0..n).fold(ActiveState::new(node.clone()), |s, i| {
        s.with_view(
            format!("v{i}@"),
            ResolvedLocals::new(node.clone()).with_template(format!("<p>{state} {i}</p>")),
        )
    });
    router.transition_to(active);
}

fn bench_unchanged(c: &mut Criterion) {
    let mut group = c.benchmark_group("unchanged");
    for &n in &[1_usize, 16, 128] {
        let s = setup(n);
        show(&s.router, "home", n);
        s.scopes
            .broadcast(s.root, Notification::StateChangeSuccess)
            .expect("initial mount");
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("broadcast_n{n}"), |b| {
            b.iter(|| {
                s.scopes
                    .broadcast(s.root, Notification::StateChangeSuccess)
                    .expect("broadcast");
            });
        });
    }
    let s = setup(1);
    show(&s.router, "home", 1);
    let _ = s.view.update(false, false).expect("mount");
    group.bench_function("single_update", |b| {
        b.iter(|| black_box(s.view.update(false, false).expect("update")));
    });
    group.finish();
}

fn bench_swap(c: &mut Criterion) {
    let mut group = c.benchmark_group("swap");
    for &n in &[1_usize, 16, 128] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("alternate_states_n{n}"), |b| {
            b.iter_batched(
                || setup(n),
                |s| {
                    for state in ["a", "b", "a", "b"] {
                        show(&s.router, state, n);
                        s.scopes
                            .broadcast(s.root, Notification::StateChangeSuccess)
                            .expect("broadcast");
                    }
                    black_box(s.scopes.len());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.bench_function("forced_remount", |b| {
        let s = setup(1);
        show(&s.router, "home", 1);
        b.iter(|| black_box(s.view.update(false, true).expect("remount")));
    });
    group.finish();
}

criterion_group!(benches, bench_unchanged, bench_swap);
criterion_main!(benches);
