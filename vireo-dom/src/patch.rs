use tracing::trace;
use vireo_core::Config;

use crate::diff::{AttrPatch, Patch, diff_children, diff_node};
use crate::{Document, DomError, NodeId, VNode};

/// Commit `patches` under `parent`. Returns the number of live writes made.
pub fn apply(doc: &mut Document, parent: NodeId, patches: &[Patch]) -> Result<usize, DomError> {
    let before = doc.mutation_count();
    for p in patches {
        apply_one(doc, parent, p)?;
    }
    Ok(doc.mutation_count() - before)
}

fn apply_one(doc: &mut Document, parent: NodeId, patch: &Patch) -> Result<(), DomError> {
    match patch {
        Patch::Append(node) => {
            let id = doc.materialize(node);
            doc.append_child(parent, id)
        }
        Patch::Remove(index) => doc.remove_child(parent, *index),
        Patch::Replace(index, node) => {
            let id = doc.materialize(node);
            doc.replace_child(parent, *index, id)
        }
        Patch::Update {
            index,
            attrs,
            children,
            meta,
        } => {
            let node = doc.child_at(parent, *index)?;
            for a in attrs {
                match a {
                    AttrPatch::Set(k, v) => {
                        doc.set_attribute(node, k, v)?;
                    }
                    AttrPatch::Remove(k) => {
                        doc.remove_attribute(node, k)?;
                    }
                }
            }
            if let Some(m) = meta {
                trace!(?node, "meta transfer");
                doc.set_meta(node, Some(m.clone()))?;
            }
            for c in children {
                apply_one(doc, node, c)?;
            }
            Ok(())
        }
    }
}

/// Reconcile the live child at `index` of `parent` from `old` to `new`.
/// A missing `old` appends, a missing `new` removes.
pub fn patch(
    doc: &mut Document,
    parent: NodeId,
    new: Option<&VNode>,
    old: Option<&VNode>,
    index: usize,
    config: &Config,
) -> Result<usize, DomError> {
    let p = match (new, old) {
        (None, None) => return Ok(0),
        (Some(n), None) => Patch::Append(n.clone()),
        (None, Some(_)) => Patch::Remove(index),
        (Some(n), Some(o)) => match diff_node(index, o, n, config) {
            Some(p) => p,
            None => return Ok(0),
        },
    };
    apply(doc, parent, std::slice::from_ref(&p))
}

/// Move the children of `parent` from generation `old` to generation `new`.
pub fn patch_children(
    doc: &mut Document,
    parent: NodeId,
    old: &[VNode],
    new: &[VNode],
    config: &Config,
) -> Result<usize, DomError> {
    let patches = diff_children(old, new, config);
    apply(doc, parent, &patches)
}
