use std::rc::Rc;

use vireo_core::Config;

use crate::{NodeMeta, Props, VNode};

#[derive(Debug, Clone, PartialEq)]
pub enum AttrPatch {
    Set(String, String),
    Remove(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Materialize and append after the current last child.
    Append(VNode),
    Remove(usize),
    Replace(usize, VNode),
    /// Keep the live node at `index` and reconcile it in place.
    Update {
        index: usize,
        attrs: Vec<AttrPatch>,
        children: Vec<Patch>,
        meta: Option<Rc<NodeMeta>>,
    },
}

/// Whether `a` and `b` are different nodes rather than two versions of one.
/// Attributes and children never count.
pub fn changed(a: &VNode, b: &VNode) -> bool {
    match (a, b) {
        (VNode::Text(x), VNode::Text(y)) => x != y,
        (VNode::Comment(x), VNode::Comment(y)) => x != y,
        (VNode::Element { tag: x, .. }, VNode::Element { tag: y, .. }) => x != y,
        _ => true,
    }
}

pub fn diff_children(old: &[VNode], new: &[VNode], config: &Config) -> Vec<Patch> {
    let mut patches = Vec::new();
    let common = old.len().min(new.len());
    for i in 0..common {
        if let Some(p) = diff_node(i, &old[i], &new[i], config) {
            patches.push(p);
        }
    }
    for node in new.iter().skip(old.len()) {
        patches.push(Patch::Append(node.clone()));
    }
    // Highest index first so earlier indices stay valid.
    for i in (new.len()..old.len()).rev() {
        patches.push(Patch::Remove(i));
    }
    patches
}

/// Patch for one position present in both generations, if any is needed.
pub fn diff_node(index: usize, old: &VNode, new: &VNode, config: &Config) -> Option<Patch> {
    if changed(old, new) {
        return Some(Patch::Replace(index, new.clone()));
    }
    let (
        VNode::Element {
            props: old_props,
            children: old_children,
            meta: old_meta,
            ..
        },
        VNode::Element {
            props: new_props,
            children: new_children,
            meta: new_meta,
            ..
        },
    ) = (old, new)
    else {
        return None;
    };

    let attrs = diff_props(old_props, new_props, config);
    // A nested component owns everything below its host.
    let children = if new.is_component_host(config) {
        Vec::new()
    } else {
        diff_children(old_children, new_children, config)
    };
    let meta = if meta_differs(old_meta.as_deref(), new_meta.as_deref()) {
        Some(new_meta.clone().unwrap_or_default())
    } else {
        None
    };

    if attrs.is_empty() && children.is_empty() && meta.is_none() {
        None
    } else {
        Some(Patch::Update {
            index,
            attrs,
            children,
            meta,
        })
    }
}

fn meta_differs(old: Option<&NodeMeta>, new: Option<&NodeMeta>) -> bool {
    match (old, new) {
        (None, None) => false,
        (Some(a), Some(b)) => a != b,
        (Some(m), None) | (None, Some(m)) => !m.is_empty(),
    }
}

fn diff_props(old: &Props, new: &Props, config: &Config) -> Vec<AttrPatch> {
    let mut patches = Vec::new();
    for (k, v_new) in &new.attrs {
        if config.is_directive(k) {
            continue;
        }
        match old.attrs.get(k) {
            Some(v_old) if v_old == v_new => {}
            _ => patches.push(AttrPatch::Set(k.clone(), v_new.clone())),
        }
    }
    for k in old.attrs.keys() {
        if !config.is_directive(k) && !new.attrs.contains_key(k) {
            patches.push(AttrPatch::Remove(k.clone()));
        }
    }
    patches
}
