use vireo_core::{Config, List, Map, Object, Set, Value};
use vireo_dom::{ComponentId, VNode, comment, h, text};
use vireo_template::{ResolveError, Scope, compile, evaluate_template, resolve};

fn render(markup: &str, state: &Object) -> Result<Vec<VNode>, ResolveError> {
    let config = Config::default();
    let compiled = compile(markup, &config).unwrap();
    let mut scope = Scope::new(state, &config);
    resolve(&compiled, &mut scope, Some(ComponentId(1)))
}

fn strip_meta(nodes: Vec<VNode>) -> Vec<VNode> {
    nodes
        .into_iter()
        .map(|n| match n {
            VNode::Element {
                tag,
                props,
                children,
                ..
            } => VNode::Element {
                tag,
                props,
                children: strip_meta(children),
                meta: None,
            },
            other => other,
        })
        .collect()
}

#[test]
fn interpolates_text_and_attributes() {
    let state = Object::new().with("count", 5).with("kind", "big");
    let out = render(r#"<p class="n-{{ kind }}">{{ this.count }}</p>"#, &state).unwrap();
    assert_eq!(out, vec![h("p", vec![("class", "n-big")], vec![text("5")])]);
}

#[test]
fn failed_interpolation_blanks_the_whole_template() {
    let state = Object::new().with("a", 1);
    let out = render("<p>{{ a }} and {{ nope }}</p>", &state).unwrap();
    assert_eq!(out, vec![h("p", (), vec![text("")])]);
}

#[test]
fn nullish_values_interpolate_empty() {
    let state = Object::new().with("gone", Value::Null);
    let config = Config::default();
    let mut scope = Scope::new(&state, &config);
    assert_eq!(evaluate_template("[{{ gone }}|{{ this.missing }}]", &mut scope), "[|]");
}

#[test]
fn false_condition_leaves_a_placeholder() {
    let state = Object::new().with("show", false);
    let out = render(r#"<ul><li data-x.if="this.show">hi</li><li>b</li></ul>"#, &state).unwrap();
    assert_eq!(
        out,
        vec![h(
            "ul",
            (),
            vec![comment("data-x.if removed node"), h("li", (), vec![text("b")])]
        )]
    );

    state.set("show", true);
    let out = render(r#"<ul><li data-x.if="this.show">hi</li><li>b</li></ul>"#, &state).unwrap();
    assert_eq!(
        out,
        vec![h(
            "ul",
            (),
            vec![h("li", (), vec![text("hi")]), h("li", (), vec![text("b")])]
        )]
    );
}

#[test]
fn repetition_clones_per_item() {
    let state = Object::new().with("items", List::from(vec![Value::from("a"), Value::from("b")]));
    let out = render(
        r#"<ul><li data-x.for="item in this.items" title="{{ item }}">{{ item }}</li></ul>"#,
        &state,
    )
    .unwrap();
    assert_eq!(
        out,
        vec![h(
            "ul",
            (),
            vec![
                h("li", vec![("title", "a")], vec![text("a")]),
                h("li", vec![("title", "b")], vec![text("b")]),
            ]
        )]
    );
}

#[test]
fn condition_is_evaluated_per_clone() {
    let todo = |t: &str, done: bool| Value::from(Object::new().with("title", t).with("done", done));
    let state = Object::new().with("todos", List::from(vec![todo("a", true), todo("b", false)]));
    let out = render(
        r#"<li data-x.for="t in todos" data-x.if="!t.done">{{ t.title }}</li>"#,
        &state,
    )
    .unwrap();
    assert_eq!(
        out,
        vec![comment("data-x.if removed node"), h("li", (), vec![text("b")])]
    );
}

#[test]
fn nested_repetition_sees_outer_variable() {
    let rows = List::from(vec![
        Value::from(List::from(vec![Value::from(1), Value::from(2)])),
        Value::from(List::from(vec![Value::from(3)])),
    ]);
    let state = Object::new().with("rows", rows);
    let out = render(
        r#"<div data-x.for="row in rows"><span data-x.for="cell in row">{{ cell }}/{{ row.length }}</span></div>"#,
        &state,
    )
    .unwrap();
    assert_eq!(
        out,
        vec![
            h(
                "div",
                (),
                vec![h("span", (), vec![text("1/2")]), h("span", (), vec![text("2/2")])]
            ),
            h("div", (), vec![h("span", (), vec![text("3/1")])]),
        ]
    );
}

#[test]
fn iteration_over_maps_sets_and_objects() {
    let map = Map::new();
    map.set("k", 1);
    let set = Set::new();
    set.add("x");
    set.add("x");
    let state = Object::new()
        .with("map", map)
        .with("set", set)
        .with("obj", Object::new().with("p", 1).with("q", 2))
        .with("none", Value::Null);
    let out = render(
        r#"<i data-x.for="e in map">{{ e[0] }}={{ e[1] }}</i><b data-x.for="s in set">{{ s }}</b><u data-x.for="k in obj">{{ k }}</u><s data-x.for="n in none">x</s>"#,
        &state,
    )
    .unwrap();
    assert_eq!(
        out,
        vec![
            h("i", (), vec![text("k=1")]),
            h("b", (), vec![text("x")]),
            h("u", (), vec![text("p")]),
            h("u", (), vec![text("q")]),
        ]
    );
}

#[test]
fn non_iterable_produces_no_clones() {
    let state = Object::new().with("n", 3);
    let out = render(r#"<li data-x.for="i in n">x</li>"#, &state).unwrap();
    assert!(out.is_empty());
}

#[test]
fn malformed_repetition_is_fatal() {
    let state = Object::new();
    let err = render(r#"<li data-x.for="this.items">x</li>"#, &state).unwrap_err();
    assert_eq!(
        err,
        ResolveError::DirectiveSyntax {
            expression: "this.items".into()
        }
    );
}

#[test]
fn events_and_loop_locals_ride_in_metadata() {
    let state = Object::new().with("items", List::from(vec![Value::from("a")]));
    let out = render(
        r#"<button data-x.for="item in items" data-x:click="this.picked = item">{{ item }}</button>"#,
        &state,
    )
    .unwrap();
    let meta = out[0].meta().unwrap();
    assert_eq!(meta.owner, Some(ComponentId(1)));
    assert_eq!(meta.locals, vec![("item".to_string(), Value::from("a"))]);
    assert_eq!(meta.listeners[0].event, "click");
    assert_eq!(meta.listeners[0].expression, "this.picked = item");
    // the binding stays visible on the element
    assert_eq!(
        strip_meta(out),
        vec![h(
            "button",
            vec![("data-x:click", "this.picked = item")],
            vec![text("a")]
        )]
    );
}

#[test]
fn hosts_carry_inputs_but_no_children() {
    let todo = Object::new().with("title", "t");
    let state = Object::new().with("todo", todo.clone());
    let out = render(
        r#"<todo-item data-x.todo="this.todo" class="row"><p>ignored</p></todo-item>"#,
        &state,
    )
    .unwrap();
    let meta = out[0].meta().unwrap();
    assert_eq!(meta.inputs, vec![("todo".to_string(), Value::from(todo))]);
    assert_eq!(strip_meta(out), vec![h("todo-item", vec![("class", "row")], vec![])]);
}

#[test]
fn diagnostics_list_every_bad_expression() {
    let config = Config::default();
    let compiled = compile(
        r#"<p data-x.if="a +" title="{{ ) }}"><i data-x.for="oops">{{ ok }}</i></p>"#,
        &config,
    )
    .unwrap();
    assert_eq!(compiled.diagnostics().len(), 3);
}
