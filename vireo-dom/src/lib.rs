use std::rc::Rc;

use indexmap::IndexMap;
use vireo_core::{Config, Value};

pub mod diff;
pub mod document;
pub mod patch;
pub mod serialize;

pub use document::{Document, DomError, NodeId, NodeKind};

/// Structural snapshot of one markup node for a single render generation.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Element {
        tag: String,
        props: Props,
        children: Vec<VNode>,
        meta: Option<Rc<NodeMeta>>,
    },
    Text(String),
    /// Neutral placeholder left where a conditional removed an element.
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Props {
    pub attrs: IndexMap<String, String>,
}

impl Props {
    pub fn new() -> Self {
        Self {
            attrs: IndexMap::new(),
        }
    }
    pub fn set(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        self.attrs.insert(k.into(), v.into());
        self
    }
    pub fn get(&self, k: &str) -> Option<&str> {
        self.attrs.get(k).map(String::as_str)
    }
}

// `h("p", (), ..)` and `h("p", vec![("class", "x")], ..)`
impl From<()> for Props {
    fn from(_: ()) -> Self {
        Props::default()
    }
}
impl From<Vec<(&str, &str)>> for Props {
    fn from(v: Vec<(&str, &str)>) -> Self {
        let mut p = Props::new();
        for (k, v) in v {
            p.attrs.insert(k.to_string(), v.to_string());
        }
        p
    }
}

/// Identifies the component instance whose template produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u64);

/// An event binding captured from the event namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Listener {
    pub event: String,
    pub expression: String,
}

/// Render-time data riding along with an element: the owning component, loop
/// variables in scope, event bindings and values for a child component's
/// inputs. Not part of structural identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeMeta {
    pub owner: Option<ComponentId>,
    pub locals: Vec<(String, Value)>,
    pub listeners: Vec<Listener>,
    pub inputs: Vec<(String, Value)>,
}

impl NodeMeta {
    pub fn is_empty(&self) -> bool {
        self.owner.is_none()
            && self.locals.is_empty()
            && self.listeners.is_empty()
            && self.inputs.is_empty()
    }

    pub fn listeners_for<'a>(&'a self, event: &'a str) -> impl Iterator<Item = &'a Listener> + 'a {
        self.listeners.iter().filter(move |l| l.event == event)
    }
}

/// A host element is a component if its tag is hyphenated or it carries the
/// component marker attribute.
pub fn is_component_host(tag: &str, props: &Props, config: &Config) -> bool {
    tag.contains('-') || props.attrs.contains_key(&config.component_attr)
}

impl VNode {
    pub fn is_component_host(&self, config: &Config) -> bool {
        match self {
            VNode::Element { tag, props, .. } => is_component_host(tag, props, config),
            _ => false,
        }
    }

    pub fn meta(&self) -> Option<&Rc<NodeMeta>> {
        match self {
            VNode::Element { meta, .. } => meta.as_ref(),
            _ => None,
        }
    }
}

pub fn h(tag: impl Into<String>, props: impl Into<Props>, children: Vec<VNode>) -> VNode {
    VNode::Element {
        tag: tag.into(),
        props: props.into(),
        children,
        meta: None,
    }
}
pub fn text(t: impl Into<String>) -> VNode {
    VNode::Text(t.into())
}
pub fn comment(t: impl Into<String>) -> VNode {
    VNode::Comment(t.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_tree() {
        let node = h(
            "div",
            vec![("class", "app")],
            vec![text("hello"), h("span", (), vec![text("world")])],
        );
        if let VNode::Element {
            tag,
            props,
            children,
            ..
        } = node
        {
            assert_eq!(tag, "div");
            assert_eq!(props.get("class"), Some("app"));
            assert_eq!(children.len(), 2);
        } else {
            panic!("expected element");
        }
    }

    #[test]
    fn hyphenated_tags_and_markers_are_hosts() {
        let config = Config::default();
        assert!(h("todo-item", (), vec![]).is_component_host(&config));
        assert!(h("div", vec![("data-x-component", "App")], vec![]).is_component_host(&config));
        assert!(!h("div", (), vec![]).is_component_host(&config));
    }
}
