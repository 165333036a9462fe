//! One-time compilation of a component's markup.
//!
//! Text and attribute values are split into literal and `{{ }}` segments,
//! directive and event attributes are pulled out of the attribute list, and
//! every expression is parsed up front. Parse failures are kept in place so
//! rendering can report them where they occur.

use tracing::debug;
use vireo_core::{Config, Value};

use crate::error::{EvalError, MarkupError, ParseError, ResolveError};
use crate::eval::{Scope, report, try_evaluate};
use crate::expr::{ForClause, Program, parse_for_clause, parse_program};
use crate::template_ast::Node;
use crate::template_parse::parse_markup;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Expr(Result<Program, ParseError>),
}

/// Literal text with `{{ expression }}` interpolations.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = text;
        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else {
                break;
            };
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            segments.push(Segment::Expr(parse_program(after[..close].trim())));
            rest = &after[close + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Template {
            source: text.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_static(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    pub fn try_render(&self, scope: &mut Scope) -> Result<String, EvalError> {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Expr(Ok(p)) => out.push_str(&try_evaluate(p, scope)?.to_template_string()),
                Segment::Expr(Err(e)) => return Err(e.clone().into()),
            }
        }
        Ok(out)
    }

    /// Render, falling back to an empty string when any interpolation fails.
    pub fn render(&self, scope: &mut Scope) -> String {
        match self.try_render(scope) {
            Ok(s) => s,
            Err(e) => {
                report(&self.source, &e, scope);
                String::new()
            }
        }
    }

    fn parse_errors(&self) -> impl Iterator<Item = &ParseError> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Expr(Err(e)) => Some(e),
            _ => None,
        })
    }
}

/// Interpolate `text` against `scope` without keeping the parsed form.
pub fn evaluate_template(text: &str, scope: &mut Scope) -> String {
    Template::parse(text).render(scope)
}

/// A directive or input expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub source: String,
    pub program: Result<Program, ParseError>,
}

impl Directive {
    fn new(source: &str) -> Self {
        Directive {
            source: source.to_string(),
            program: parse_program(source),
        }
    }

    pub fn evaluate(&self, scope: &mut Scope) -> Value {
        let result = match &self.program {
            Ok(p) => try_evaluate(p, scope),
            Err(e) => Err(EvalError::Parse(e.clone())),
        };
        match result {
            Ok(v) => v,
            Err(e) => {
                report(&self.source, &e, scope);
                Value::Undefined
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompiledAttr {
    Plain { name: String, value: Template },
    /// Kept verbatim on the element; the expression runs on dispatch.
    Event {
        name: String,
        event: String,
        expression: Directive,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledElement {
    pub tag: String,
    pub attrs: Vec<CompiledAttr>,
    pub condition: Option<Directive>,
    pub repeat: Option<Result<ForClause, ResolveError>>,
    pub inputs: Vec<(String, Directive)>,
    pub children: Vec<CompiledNode>,
    pub host: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompiledNode {
    Element(Box<CompiledElement>),
    Text(Template),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledTemplate {
    pub nodes: Vec<CompiledNode>,
}

impl CompiledTemplate {
    /// Every problem a render pass could run into, for up-front checking.
    pub fn diagnostics(&self) -> Vec<ResolveError> {
        let mut out = Vec::new();
        let mut stack: Vec<&CompiledNode> = self.nodes.iter().collect();
        while let Some(node) = stack.pop() {
            match node {
                CompiledNode::Text(t) => {
                    out.extend(t.parse_errors().cloned().map(ResolveError::from));
                }
                CompiledNode::Comment(_) => {}
                CompiledNode::Element(el) => {
                    if let Some(Err(e)) = &el.repeat {
                        out.push(e.clone());
                    }
                    let directives = el
                        .condition
                        .iter()
                        .chain(el.inputs.iter().map(|(_, d)| d))
                        .chain(el.attrs.iter().filter_map(|a| match a {
                            CompiledAttr::Event { expression, .. } => Some(expression),
                            CompiledAttr::Plain { .. } => None,
                        }));
                    for d in directives {
                        if let Err(e) = &d.program {
                            out.push(e.clone().into());
                        }
                    }
                    for a in &el.attrs {
                        if let CompiledAttr::Plain { value, .. } = a {
                            out.extend(value.parse_errors().cloned().map(ResolveError::from));
                        }
                    }
                    stack.extend(el.children.iter());
                }
            }
        }
        out
    }
}

pub fn compile(markup: &str, config: &Config) -> Result<CompiledTemplate, MarkupError> {
    let nodes = parse_markup(markup)?;
    let compiled = CompiledTemplate {
        nodes: nodes.iter().map(|n| compile_node(n, config)).collect(),
    };
    debug!(nodes = compiled.nodes.len(), "compiled template");
    Ok(compiled)
}

fn compile_node(node: &Node, config: &Config) -> CompiledNode {
    match node {
        Node::Text(t) => CompiledNode::Text(Template::parse(t)),
        Node::Comment(c) => CompiledNode::Comment(c.clone()),
        Node::Element {
            tag,
            attrs,
            children,
        } => {
            let mut el = CompiledElement {
                tag: tag.clone(),
                attrs: Vec::new(),
                condition: None,
                repeat: None,
                inputs: Vec::new(),
                children: Vec::new(),
                host: tag.contains('-'),
            };
            for a in attrs {
                let value = a.value_or_empty();
                if let Some(directive) = config.directive_name(&a.name) {
                    match directive {
                        "if" => el.condition = Some(Directive::new(value)),
                        "for" => {
                            el.repeat = Some(parse_for_clause(value).map_err(|_| {
                                ResolveError::DirectiveSyntax {
                                    expression: value.to_string(),
                                }
                            }))
                        }
                        input => el.inputs.push((input.to_string(), Directive::new(value))),
                    }
                } else if let Some(event) = config.event_name(&a.name) {
                    el.attrs.push(CompiledAttr::Event {
                        name: a.name.clone(),
                        event: event.to_string(),
                        expression: Directive::new(value),
                    });
                } else {
                    if a.name == config.component_attr {
                        el.host = true;
                    }
                    el.attrs.push(CompiledAttr::Plain {
                        name: a.name.clone(),
                        value: Template::parse(value),
                    });
                }
            }
            if !el.host {
                el.children = children.iter().map(|c| compile_node(c, config)).collect();
            }
            CompiledNode::Element(Box::new(el))
        }
    }
}
