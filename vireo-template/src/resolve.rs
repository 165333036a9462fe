//! Per-render directive resolution: turns a compiled template plus the
//! current controller state into one generation of virtual nodes.

use std::rc::Rc;

use tracing::{instrument, trace};
use vireo_core::{List, Value};
use vireo_dom::{ComponentId, Listener, NodeMeta, Props, VNode};

use crate::compile::{CompiledAttr, CompiledElement, CompiledNode, CompiledTemplate};
use crate::error::{EvalError, ResolveError};
use crate::eval::{Scope, report, try_evaluate};

/// Resolve `template` against `scope`. Only a malformed repetition is fatal;
/// evaluation failures degrade to empty output and are logged.
#[instrument(level = "debug", skip_all, fields(owner = ?owner))]
pub fn resolve(
    template: &CompiledTemplate,
    scope: &mut Scope,
    owner: Option<ComponentId>,
) -> Result<Vec<VNode>, ResolveError> {
    let mut out = Vec::new();
    resolve_nodes(&template.nodes, scope, owner, &mut out)?;
    Ok(out)
}

fn resolve_nodes(
    nodes: &[CompiledNode],
    scope: &mut Scope,
    owner: Option<ComponentId>,
    out: &mut Vec<VNode>,
) -> Result<(), ResolveError> {
    for node in nodes {
        match node {
            CompiledNode::Text(t) => out.push(VNode::Text(t.render(scope))),
            CompiledNode::Comment(c) => out.push(VNode::Comment(c.clone())),
            CompiledNode::Element(el) => match &el.repeat {
                Some(clause) => {
                    let clause = clause.as_ref().map_err(Clone::clone)?;
                    let items = match try_evaluate(&clause.iterable, scope).and_then(iterate) {
                        Ok(items) => items,
                        Err(e) => {
                            report(&clause.iterable.source, &e, scope);
                            Vec::new()
                        }
                    };
                    trace!(var = %clause.var, count = items.len(), "repeat");
                    for item in items {
                        scope.push_local(clause.var.clone(), item);
                        let res = emit(el, scope, owner, out);
                        scope.pop_local();
                        res?;
                    }
                }
                None => emit(el, scope, owner, out)?,
            },
        }
    }
    Ok(())
}

/// Items a repetition produces for `value`.
pub fn iterate(value: Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::Undefined | Value::Null => Ok(Vec::new()),
        Value::List(l) => Ok(l.to_vec()),
        Value::Set(s) => Ok(s.to_vec()),
        Value::Map(m) => Ok(m
            .entries()
            .into_iter()
            .map(|(k, v)| Value::from(List::from(vec![Value::from(k), v])))
            .collect()),
        Value::Object(o) => Ok(o.keys().into_iter().map(Value::from).collect()),
        other => Err(EvalError::NotIterable(other.type_name())),
    }
}

fn emit(
    el: &CompiledElement,
    scope: &mut Scope,
    owner: Option<ComponentId>,
    out: &mut Vec<VNode>,
) -> Result<(), ResolveError> {
    if let Some(cond) = &el.condition {
        if !cond.evaluate(scope).is_truthy() {
            // Placeholder keeps sibling positions stable between generations.
            let text = format!("{}if removed node", scope.config().directive_prefix);
            out.push(VNode::Comment(text));
            return Ok(());
        }
    }

    let mut props = Props::new();
    let mut listeners = Vec::new();
    for a in &el.attrs {
        match a {
            CompiledAttr::Plain { name, value } => {
                props.attrs.insert(name.clone(), value.render(scope));
            }
            CompiledAttr::Event {
                name,
                event,
                expression,
            } => {
                props.attrs.insert(name.clone(), expression.source.clone());
                listeners.push(Listener {
                    event: event.clone(),
                    expression: expression.source.clone(),
                });
            }
        }
    }
    let inputs: Vec<(String, Value)> = el
        .inputs
        .iter()
        .map(|(name, d)| (name.clone(), d.evaluate(scope)))
        .collect();

    let meta = if el.host || !listeners.is_empty() || !inputs.is_empty() {
        Some(Rc::new(NodeMeta {
            owner,
            locals: scope.locals().to_vec(),
            listeners,
            inputs,
        }))
    } else {
        None
    };

    let mut children = Vec::new();
    if !el.host {
        resolve_nodes(&el.children, scope, owner, &mut children)?;
    }
    out.push(VNode::Element {
        tag: el.tag.clone(),
        props,
        children,
        meta,
    });
    Ok(())
}
