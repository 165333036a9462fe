use std::fs;
use std::path::PathBuf;

use vireo_core::{Config, Value};
use vireo_cli::{check_cmd, check_source, parse_state, render_cmd, render_source};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("vireo-cli-tests")
        .join(format!("{}-{name}", std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

#[test]
fn renders_template_against_json_state() {
    let state = parse_state(r#"{"title": "Todos", "items": [{"t": "a"}, {"t": "b"}], "n": 2}"#)
        .expect("state");
    let html = render_source(
        r#"<h1>{{ title }} ({{ n }})</h1><ul><li data-x.for="i in items">{{ i.t }}</li></ul>"#,
        state,
        Config::default(),
    )
    .expect("render");
    assert_eq!(html, "<h1>Todos (2)</h1><ul><li>a</li><li>b</li></ul>");
}

#[test]
fn state_must_be_an_object() {
    assert!(parse_state("[1, 2]").is_err());
    assert!(parse_state("{").is_err());
    let obj = parse_state(r#"{"done": true, "none": null}"#).unwrap();
    assert_eq!(obj.get("done"), Value::Bool(true));
    assert_eq!(obj.get("none"), Value::Null);
}

#[test]
fn check_reports_each_bad_expression() {
    let config = Config::default();
    assert!(check_source(r#"<p title="{{ a }}">{{ b.c }}</p>"#, &config).is_empty());
    let problems = check_source(r#"<p data-x.if="a +">{{ ) }}</p>"#, &config);
    assert_eq!(problems.len(), 2);
    assert_eq!(check_source("<div><p></div>", &config).len(), 1);
}

#[test]
fn file_commands_read_template_state_and_config() {
    let dir = scratch("files");
    let template = dir.join("page.html");
    let state = dir.join("state.json");
    let config = dir.join("config.json");
    fs::write(&template, r#"<p v.if="show">{{ msg }}</p>"#).unwrap();
    fs::write(&state, r#"{"show": true, "msg": "hi"}"#).unwrap();
    fs::write(&config, r#"{"directive_prefix": "v."}"#).unwrap();

    let html = render_cmd(&template, Some(&state), Some(&config)).unwrap();
    assert_eq!(html, "<p>hi</p>");
    assert!(check_cmd(&template, Some(&config)).unwrap().is_empty());

    assert!(render_cmd(&dir.join("missing.html"), None, None).is_err());
}
