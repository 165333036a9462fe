use std::rc::Rc;

use vireo_core::Config;
use vireo_dom::{
    NodeMeta, Props, VNode,
    diff::{AttrPatch, Patch, changed, diff_children},
    h, text,
};

fn cfg() -> Config {
    Config::default()
}

#[test]
fn props_set_and_remove() {
    let a = vec![h("div", vec![("class", "a"), ("id", "x")], vec![])];
    let b = vec![h("div", vec![("class", "b")], vec![])];

    let patches = diff_children(&a, &b, &cfg());

    assert_eq!(
        patches,
        vec![Patch::Update {
            index: 0,
            attrs: vec![
                AttrPatch::Set("class".into(), "b".into()),
                AttrPatch::Remove("id".into()),
            ],
            children: vec![],
            meta: None,
        }]
    );
}

#[test]
fn append_child() {
    let a = vec![h("ul", Props::new(), vec![])];
    let b = vec![h("ul", Props::new(), vec![text("item")])];

    let patches = diff_children(&a, &b, &cfg());

    let Patch::Update { children, .. } = &patches[0] else {
        panic!("expected update, got {patches:?}");
    };
    assert_eq!(children, &vec![Patch::Append(text("item"))]);
}

#[test]
fn removals_run_from_the_end() {
    let a = vec![text("a"), text("b"), text("c")];
    let b = vec![text("a")];

    let patches = diff_children(&a, &b, &cfg());

    assert_eq!(patches, vec![Patch::Remove(2), Patch::Remove(1)]);
}

#[test]
fn replace_on_tag_change() {
    let a = vec![h("div", Props::new(), vec![])];
    let b = vec![h("span", Props::new(), vec![])];

    let patches = diff_children(&a, &b, &cfg());
    assert_eq!(patches, vec![Patch::Replace(0, b[0].clone())]);
}

#[test]
fn text_change_replaces() {
    let patches = diff_children(&[text("hello")], &[text("world")], &cfg());
    assert_eq!(patches, vec![Patch::Replace(0, text("world"))]);
}

#[test]
fn identical_generations_produce_nothing() {
    let tree = vec![h(
        "ul",
        vec![("class", "list")],
        vec![h("li", (), vec![text("a")]), VNode::Comment("if".into())],
    )];
    assert!(!changed(&tree[0], &tree[0].clone()));
    assert!(diff_children(&tree, &tree.clone(), &cfg()).is_empty());
}

#[test]
fn kind_mismatch_is_a_change() {
    assert!(changed(&text("x"), &VNode::Comment("x".into())));
    assert!(changed(&text("x"), &h("x", (), vec![])));
    assert!(!changed(
        &h("p", vec![("a", "1")], vec![]),
        &h("p", vec![("a", "2")], vec![text("t")])
    ));
}

#[test]
fn component_hosts_are_diffed_at_the_boundary() {
    let old = vec![h("todo-item", vec![("class", "a")], vec![text("child owned")])];
    let new = vec![h("todo-item", vec![("class", "b")], vec![])];

    let patches = diff_children(&old, &new, &cfg());

    assert_eq!(
        patches,
        vec![Patch::Update {
            index: 0,
            attrs: vec![AttrPatch::Set("class".into(), "b".into())],
            children: vec![],
            meta: None,
        }]
    );
}

#[test]
fn directive_attributes_are_skipped() {
    let old = vec![h("p", (), vec![])];
    let new = vec![h("p", vec![("data-x.if", "this.show")], vec![])];
    assert!(diff_children(&old, &new, &cfg()).is_empty());
}

#[test]
fn changed_metadata_is_transferred() {
    let meta = Rc::new(NodeMeta {
        locals: vec![("item".into(), "b".into())],
        ..Default::default()
    });
    let old = vec![h("li", (), vec![])];
    let new = vec![VNode::Element {
        tag: "li".into(),
        props: Props::new(),
        children: vec![],
        meta: Some(meta.clone()),
    }];

    let patches = diff_children(&old, &new, &cfg());

    assert_eq!(
        patches,
        vec![Patch::Update {
            index: 0,
            attrs: vec![],
            children: vec![],
            meta: Some(meta),
        }]
    );
}
