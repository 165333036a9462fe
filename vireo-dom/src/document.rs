//! Arena-backed live tree the patcher commits into.

use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::trace;

use crate::{NodeMeta, Props, VNode};

/// Slot index plus the generation the slot had when the node was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomError {
    #[error("node {0:?} does not exist")]
    MissingNode(NodeId),

    #[error("node {parent:?} has no child at index {index}")]
    MissingChild { parent: NodeId, index: usize },

    #[error("node {0:?} cannot have children")]
    NotAContainer(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    meta: Option<Rc<NodeMeta>>,
}

/// Live document. Freed slots are recycled under a bumped generation, so a
/// stale id stops resolving once its node is removed.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Slot>,
    vacant: Vec<usize>,
    root: NodeId,
    mutations: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Document {
            nodes: Vec::new(),
            vacant: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            mutations: 0,
        };
        doc.root = doc.alloc(NodeKind::Root);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of structural and attribute writes committed so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    /// Slots held by the arena, live or vacant.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            meta: None,
        };
        let index = match self.vacant.pop() {
            Some(index) => index,
            None => {
                self.nodes.push(Slot::default());
                self.nodes.len() - 1
            }
        };
        let slot = &mut self.nodes[index];
        slot.data = Some(data);
        NodeId {
            index,
            generation: slot.generation,
        }
    }

    fn data(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
            .ok_or(DomError::MissingNode(id))
    }

    fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
            .ok_or(DomError::MissingNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.data(id).is_ok()
    }

    /// True when `id` is alive and reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == self.root {
                return true;
            }
            cur = self.data(n).ok().and_then(|d| d.parent);
        }
        false
    }

    pub fn create_element(&mut self, tag: impl Into<String>, props: Props) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.into(),
            attrs: props.attrs,
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Comment(text.into()))
    }

    /// Build a detached live subtree from a virtual node, metadata included.
    pub fn materialize(&mut self, vnode: &VNode) -> NodeId {
        match vnode {
            VNode::Text(t) => self.create_text(t.clone()),
            VNode::Comment(t) => self.create_comment(t.clone()),
            VNode::Element {
                tag,
                props,
                children,
                meta,
            } => {
                let id = self.create_element(tag.clone(), props.clone());
                for child in children {
                    let c = self.materialize(child);
                    self.link(id, c);
                }
                if let Ok(d) = self.data_mut(id) {
                    d.meta = meta.clone();
                }
                id
            }
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Ok(d) = self.data_mut(child) {
            d.parent = Some(parent);
        }
        if let Ok(d) = self.data_mut(parent) {
            d.children.push(child);
        }
    }

    fn ensure_container(&self, id: NodeId) -> Result<(), DomError> {
        match self.data(id)?.kind {
            NodeKind::Root | NodeKind::Element { .. } => Ok(()),
            _ => Err(DomError::NotAContainer(id)),
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.ensure_container(parent)?;
        self.data(child)?;
        self.detach(child);
        self.link(parent, child);
        self.mutations += 1;
        trace!(?parent, ?child, "append");
        Ok(())
    }

    /// Insert `child` before position `index`; an index past the end appends.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), DomError> {
        self.ensure_container(parent)?;
        self.data(child)?;
        self.detach(child);
        let data = self.data_mut(parent)?;
        let at = index.min(data.children.len());
        data.children.insert(at, child);
        self.data_mut(child)?.parent = Some(parent);
        self.mutations += 1;
        trace!(?parent, index = at, "insert");
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Result<(), DomError> {
        let child = self.child_at(parent, index)?;
        self.data_mut(parent)?.children.remove(index);
        self.free(child);
        self.mutations += 1;
        trace!(?parent, index, "remove");
        Ok(())
    }

    pub fn replace_child(
        &mut self,
        parent: NodeId,
        index: usize,
        replacement: NodeId,
    ) -> Result<(), DomError> {
        let old = self.child_at(parent, index)?;
        self.data(replacement)?;
        self.detach(replacement);
        self.data_mut(parent)?.children[index] = replacement;
        self.data_mut(replacement)?.parent = Some(parent);
        self.free(old);
        self.mutations += 1;
        trace!(?parent, index, "replace");
        Ok(())
    }

    fn detach(&mut self, id: NodeId) {
        let parent = self.data(id).ok().and_then(|d| d.parent);
        if let Some(p) = parent {
            if let Ok(pd) = self.data_mut(p) {
                pd.children.retain(|c| *c != id);
            }
        }
        if let Ok(d) = self.data_mut(id) {
            d.parent = None;
        }
    }

    fn free(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(slot) = self.nodes.get_mut(n.index) else {
                continue;
            };
            if slot.generation != n.generation {
                continue;
            }
            if let Some(d) = slot.data.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.vacant.push(n.index);
                stack.extend(d.children);
            }
        }
    }

    /// Set an attribute. Returns false, and counts nothing, when the live
    /// value already matches.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<bool, DomError> {
        let NodeKind::Element { attrs, .. } = &mut self.data_mut(id)?.kind else {
            return Err(DomError::NotAContainer(id));
        };
        if attrs.get(name).map(String::as_str) == Some(value) {
            return Ok(false);
        }
        attrs.insert(name.to_string(), value.to_string());
        self.mutations += 1;
        Ok(true)
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, DomError> {
        let NodeKind::Element { attrs, .. } = &mut self.data_mut(id)?.kind else {
            return Err(DomError::NotAContainer(id));
        };
        if attrs.shift_remove(name).is_none() {
            return Ok(false);
        }
        self.mutations += 1;
        Ok(true)
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<bool, DomError> {
        let data = self.data_mut(id)?;
        match &mut data.kind {
            NodeKind::Text(t) | NodeKind::Comment(t) => {
                if t == text {
                    return Ok(false);
                }
                *t = text.to_string();
            }
            _ => return Err(DomError::NotAContainer(id)),
        }
        self.mutations += 1;
        Ok(true)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.data(id).ok().map(|d| &d.kind)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> Props {
        match self.kind(id) {
            Some(NodeKind::Element { attrs, .. }) => Props {
                attrs: attrs.clone(),
            },
            _ => Props::new(),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).ok().and_then(|d| d.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    pub fn child_at(&self, parent: NodeId, index: usize) -> Result<NodeId, DomError> {
        self.data(parent)?
            .children
            .get(index)
            .copied()
            .ok_or(DomError::MissingChild { parent, index })
    }

    pub fn meta(&self, id: NodeId) -> Option<Rc<NodeMeta>> {
        self.data(id).ok().and_then(|d| d.meta.clone())
    }

    /// Replace the render-time metadata of a node. Not a structural write.
    pub fn set_meta(&mut self, id: NodeId, meta: Option<Rc<NodeMeta>>) -> Result<(), DomError> {
        self.data_mut(id)?.meta = meta;
        Ok(())
    }

    /// Preorder walk of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if !self.contains(n) {
                continue;
            }
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.descendants(id) {
            if let Some(NodeKind::Text(t)) = self.kind(n) {
                out.push_str(t);
            }
        }
        out
    }

    /// Structural snapshot of a live node.
    pub fn to_virtual_tree(&self, id: NodeId) -> Option<VNode> {
        let data = self.data(id).ok()?;
        Some(match &data.kind {
            NodeKind::Text(t) => VNode::Text(t.clone()),
            NodeKind::Comment(t) => VNode::Comment(t.clone()),
            NodeKind::Element { tag, attrs } => VNode::Element {
                tag: tag.clone(),
                props: Props {
                    attrs: attrs.clone(),
                },
                children: self.virtual_children(id),
                meta: data.meta.clone(),
            },
            NodeKind::Root => VNode::Element {
                tag: "#root".to_string(),
                props: Props::new(),
                children: self.virtual_children(id),
                meta: None,
            },
        })
    }

    pub fn virtual_children(&self, id: NodeId) -> Vec<VNode> {
        self.children(id)
            .iter()
            .filter_map(|c| self.to_virtual_tree(*c))
            .collect()
    }

    /// Append materialized copies of `nodes` under `parent`.
    pub fn mount(&mut self, parent: NodeId, nodes: &[VNode]) -> Result<Vec<NodeId>, DomError> {
        let mut ids = Vec::with_capacity(nodes.len());
        for n in nodes {
            let id = self.materialize(n);
            self.append_child(parent, id)?;
            ids.push(id);
        }
        Ok(ids)
    }
}
