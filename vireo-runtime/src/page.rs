//! Static page markup turned into virtual nodes the document can mount.

use vireo_dom::{Props, VNode};
use vireo_template::{MarkupError, Node, parse_markup};

/// Parse page markup without evaluating anything. Interpolations and
/// directives stay as written; component hosts keep their light content until
/// their controller renders over it.
pub fn parse_page(markup: &str) -> Result<Vec<VNode>, MarkupError> {
    Ok(parse_markup(markup)?.iter().map(to_vnode).collect())
}

fn to_vnode(node: &Node) -> VNode {
    match node {
        Node::Element {
            tag,
            attrs,
            children,
        } => {
            let mut props = Props::new();
            for attr in attrs {
                props
                    .attrs
                    .insert(attr.name.clone(), attr.value_or_empty().to_string());
            }
            VNode::Element {
                tag: tag.clone(),
                props,
                children: children.iter().map(to_vnode).collect(),
                meta: None,
            }
        }
        Node::Text(t) => VNode::Text(t.clone()),
        Node::Comment(t) => VNode::Comment(t.clone()),
    }
}
