use std::rc::Rc;

use vireo_core::Config;
use vireo_dom::{
    Document, NodeMeta, Props, VNode, comment, h,
    patch::{patch, patch_children},
    serialize::inner_html,
    text,
};

fn list(items: &[&str]) -> Vec<VNode> {
    vec![h(
        "ul",
        vec![("class", "items")],
        items.iter().map(|i| h("li", (), vec![text(*i)])).collect(),
    )]
}

#[test]
fn first_patch_materializes_everything() {
    let config = Config::default();
    let mut doc = Document::new();
    let root = doc.root();

    let writes = patch_children(&mut doc, root, &[], &list(&["a", "b"]), &config).unwrap();

    assert_eq!(writes, 1);
    assert_eq!(
        inner_html(&doc, root),
        "<ul class=\"items\"><li>a</li><li>b</li></ul>"
    );
}

#[test]
fn repeating_a_patch_is_a_no_op() {
    let config = Config::default();
    let mut doc = Document::new();
    let root = doc.root();
    let gen1 = list(&["a"]);
    let gen2 = list(&["a", "b", "c"]);

    patch_children(&mut doc, root, &[], &gen1, &config).unwrap();
    patch_children(&mut doc, root, &gen1, &gen2, &config).unwrap();
    let before = doc.mutation_count();
    let writes = patch_children(&mut doc, root, &gen2, &gen2, &config).unwrap();

    assert_eq!(writes, 0);
    assert_eq!(doc.mutation_count(), before);
}

#[test]
fn updates_keep_node_identity() {
    let config = Config::default();
    let mut doc = Document::new();
    let root = doc.root();
    let gen1 = vec![h("input", vec![("value", "a")], vec![])];
    let gen2 = vec![h("input", vec![("value", "b")], vec![])];

    patch_children(&mut doc, root, &[], &gen1, &config).unwrap();
    let input = doc.children(root)[0];
    patch_children(&mut doc, root, &gen1, &gen2, &config).unwrap();

    assert_eq!(doc.children(root)[0], input);
    assert_eq!(doc.attribute(input, "value"), Some("b"));
}

#[test]
fn shrinking_removes_trailing_nodes() {
    let config = Config::default();
    let mut doc = Document::new();
    let root = doc.root();
    let gen1 = list(&["a", "b", "c"]);
    let gen2 = list(&["a"]);

    patch_children(&mut doc, root, &[], &gen1, &config).unwrap();
    patch_children(&mut doc, root, &gen1, &gen2, &config).unwrap();

    assert_eq!(inner_html(&doc, root), "<ul class=\"items\"><li>a</li></ul>");
}

#[test]
fn placeholder_swaps_with_element() {
    let config = Config::default();
    let mut doc = Document::new();
    let root = doc.root();
    let hidden = vec![comment("if")];
    let shown = vec![h("li", (), vec![text("hi")])];

    patch_children(&mut doc, root, &[], &hidden, &config).unwrap();
    assert_eq!(inner_html(&doc, root), "<!--if-->");
    patch_children(&mut doc, root, &hidden, &shown, &config).unwrap();
    assert_eq!(inner_html(&doc, root), "<li>hi</li>");
    patch_children(&mut doc, root, &shown, &hidden, &config).unwrap();
    assert_eq!(inner_html(&doc, root), "<!--if-->");
}

#[test]
fn single_index_patch_follows_presence() {
    let config = Config::default();
    let mut doc = Document::new();
    let root = doc.root();
    let a = text("a");
    let b = text("b");

    patch(&mut doc, root, Some(&a), None, 0, &config).unwrap();
    assert_eq!(doc.text_content(root), "a");
    patch(&mut doc, root, Some(&b), Some(&a), 0, &config).unwrap();
    assert_eq!(doc.text_content(root), "b");
    assert_eq!(patch(&mut doc, root, Some(&b), Some(&b), 0, &config).unwrap(), 0);
    patch(&mut doc, root, None, Some(&b), 0, &config).unwrap();
    assert!(doc.children(root).is_empty());
}

#[test]
fn host_subtree_is_left_alone() {
    let config = Config::default();
    let mut doc = Document::new();
    let root = doc.root();
    let generation = vec![h("todo-item", (), vec![])];

    patch_children(&mut doc, root, &[], &generation, &config).unwrap();
    let host = doc.children(root)[0];
    // the child component commits its own content
    let inner = doc.create_text("owned by child");
    doc.append_child(host, inner).unwrap();

    let writes = patch_children(&mut doc, root, &generation, &generation.clone(), &config).unwrap();
    assert_eq!(writes, 0);
    assert_eq!(doc.text_content(host), "owned by child");
}

#[test]
fn metadata_moves_without_mutations() {
    let config = Config::default();
    let mut doc = Document::new();
    let root = doc.root();
    let with_local = |v: &str| {
        vec![VNode::Element {
            tag: "button".into(),
            props: Props::new(),
            children: vec![],
            meta: Some(Rc::new(NodeMeta {
                locals: vec![("item".into(), v.into())],
                ..Default::default()
            })),
        }]
    };
    let gen1 = with_local("a");
    let gen2 = with_local("b");

    patch_children(&mut doc, root, &[], &gen1, &config).unwrap();
    let button = doc.children(root)[0];
    let writes = patch_children(&mut doc, root, &gen1, &gen2, &config).unwrap();

    assert_eq!(writes, 0);
    let meta = doc.meta(button).unwrap();
    assert_eq!(meta.locals[0].1, vireo_core::Value::from("b"));
}

#[test]
fn snapshot_round_trips_the_live_tree() {
    let config = Config::default();
    let mut doc = Document::new();
    let root = doc.root();
    let generation = list(&["x"]);
    patch_children(&mut doc, root, &[], &generation, &config).unwrap();

    assert_eq!(doc.virtual_children(root), generation);
}

#[test]
fn long_runs_of_replacements_recycle_arena_slots() {
    let config = Config::default();
    let mut doc = Document::new();
    let root = doc.root();
    let counter = |n: usize| vec![h("div", (), vec![h("p", (), vec![text(n.to_string())])])];
    let toggled = |n: usize| {
        let child = if n % 2 == 0 { h("p", (), vec![text("on")]) } else { comment("off") };
        vec![h("div", (), vec![child])]
    };

    let mut old = counter(0);
    patch_children(&mut doc, root, &[], &old, &config).unwrap();
    let slots = doc.capacity();
    for n in 1..10_000 {
        let new = counter(n);
        patch_children(&mut doc, root, &old, &new, &config).unwrap();
        old = new;
    }
    for n in 0..1_000 {
        let new = toggled(n);
        patch_children(&mut doc, root, &old, &new, &config).unwrap();
        old = new;
    }

    assert!(doc.capacity() <= slots + 2, "arena grew to {}", doc.capacity());
    assert_eq!(inner_html(&doc, root), "<div><!--off--></div>");
}
