use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vireo_core::{Config, List, Object, Value};
use vireo_dom::{Document, Props};
use vireo_runtime::{Controller, Registry, Runtime};
use vireo_template::compile;

/// Controller name the rendered template is registered under.
pub const PAGE: &str = "Page";

/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => {
            Value::from(List::from(items.iter().map(json_to_value).collect::<Vec<_>>()))
        }
        serde_json::Value::Object(map) => {
            let obj = Object::new();
            for (k, v) in map {
                obj.set(k.as_str(), json_to_value(v));
            }
            Value::from(obj)
        }
    }
}

/// Parse controller state. Anything but a JSON object is rejected.
pub fn parse_state(json: &str) -> Result<Object> {
    let parsed: serde_json::Value = serde_json::from_str(json).context("state is not valid JSON")?;
    match json_to_value(&parsed) {
        Value::Object(obj) => Ok(obj),
        other => anyhow::bail!("state must be a JSON object, got {}", other.type_name()),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config in {}", path.display()))
}

/// Mount `markup` as the template of a single component and return the
/// markup it renders to.
pub fn render_source(markup: &str, state: Object, config: Config) -> Result<String> {
    let template = markup.to_string();
    let registry = Registry::new().with(PAGE, move |_| {
        Ok(Controller::new(state.clone(), template.clone()))
    });

    let mut doc = Document::new();
    let root = doc.root();
    let host = doc.create_element("div", Props::new().set(config.component_attr.clone(), PAGE));
    doc.append_child(root, host)?;

    let runtime = Runtime::with_config(registry, doc, config);
    runtime.load(root).context("rendering failed")?;
    for err in runtime.take_errors() {
        tracing::warn!(error = %err, "nested component failed");
    }
    Ok(runtime.inner_html(host))
}

pub fn render_cmd(template: &Path, state: Option<&Path>, config: Option<&Path>) -> Result<String> {
    let markup = fs::read_to_string(template)
        .with_context(|| format!("failed to read {}", template.display()))?;
    let state = match state {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_state(&text).with_context(|| format!("bad state in {}", path.display()))?
        }
        None => Object::new(),
    };
    let config = load_config(config)?;
    debug!(template = %template.display(), "rendering");
    render_source(&markup, state, config)
}

/// Every problem found in `markup`, one message each. Empty means clean.
pub fn check_source(markup: &str, config: &Config) -> Vec<String> {
    match compile(markup, config) {
        Ok(compiled) => compiled
            .diagnostics()
            .iter()
            .map(ToString::to_string)
            .collect(),
        Err(e) => vec![e.to_string()],
    }
}

pub fn check_cmd(template: &Path, config: Option<&Path>) -> Result<Vec<String>> {
    let markup = fs::read_to_string(template)
        .with_context(|| format!("failed to read {}", template.display()))?;
    let config = load_config(config)?;
    Ok(check_source(&markup, &config))
}
