use crate::error::DomError;
use crate::events::Listener;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a live node. Handles are generational: once a node is
    /// removed its handle never resolves again, even if the slot is reused,
    /// so two handles compare equal only when they name the same node object.
    pub struct NodeId;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

pub struct Element {
    pub tag: String,
    pub attributes: SmallVec<[Attribute; 4]>,
    pub properties: FxHashMap<String, serde_json::Value>,
    pub(crate) listeners: SmallVec<[Listener; 1]>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: SmallVec::new(),
            properties: FxHashMap::default(),
            listeners: SmallVec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

pub enum NodeKind {
    Element(Element),
    Text(String),
    Comment(String),
}

pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 4]>,
}

/// Owner of every node. A single `Document` is shared by all cases of a run;
/// each case works inside its own detached container element.
#[derive(Default)]
pub struct Document {
    nodes: SlotMap<NodeId, Node>,
    pub(crate) next_listener: u64,
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            next_listener: 0,
        }
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.insert(Node {
            kind,
            parent: None,
            children: SmallVec::new(),
        })
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(NodeKind::Element(Element::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.insert(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        self.insert(NodeKind::Comment(data.into()))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes across all containers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        match self.nodes.get_mut(id) {
            Some(Node {
                kind: NodeKind::Element(el),
                ..
            }) => Ok(el),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let idx = siblings.iter().position(|&c| c == id)?;
        siblings.get(idx + 1).copied()
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent(node) {
                Some(p) => node = p,
                None => return false,
            }
        }
    }

    /// Unlinks `id` from its parent. The node and its subtree stay alive.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        let parent = self
            .nodes
            .get_mut(id)
            .ok_or(DomError::UnknownNode(id))?
            .parent
            .take();
        if let Some(p) = parent {
            if let Some(pn) = self.nodes.get_mut(p) {
                pn.children.retain(|c| *c != id);
            }
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` under `parent` before `reference`, or at the end when
    /// `reference` is `None`. A child that already has a parent is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.element_mut(parent)?;
        if !self.contains(child) {
            return Err(DomError::UnknownNode(child));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if reference == Some(child) {
            return Ok(());
        }
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    reference: r,
                });
            }
        }

        self.detach(child)?;

        let pn = self.nodes.get_mut(parent).ok_or(DomError::UnknownNode(parent))?;
        let idx = reference
            .and_then(|r| pn.children.iter().position(|&c| c == r))
            .unwrap_or(pn.children.len());
        pn.children.insert(idx, child);
        if let Some(cn) = self.nodes.get_mut(child) {
            cn.parent = Some(parent);
        }
        Ok(())
    }

    /// Detaches `id` and frees it together with its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        self.detach(id)?;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(next) {
                pending.extend(node.children);
            }
        }
        Ok(())
    }

    /// Removes every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) -> Result<(), DomError> {
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Character data of a text or comment node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Text(t)) | Some(NodeKind::Comment(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), DomError> {
        match self.nodes.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Text(t)) | Some(NodeKind::Comment(t)) => {
                *t = value.into();
                Ok(())
            }
            Some(_) => Err(DomError::NotCharacterData(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id).map(|n| &n.kind), Some(NodeKind::Text(_)))
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(id).map(|n| &n.kind),
            Some(NodeKind::Comment(_))
        )
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attribute(name))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        let value = value.into();
        match el.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => el.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
        Ok(())
    }

    /// Returns whether the attribute was present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, DomError> {
        let el = self.element_mut(id)?;
        let before = el.attributes.len();
        el.attributes.retain(|a| a.name != name);
        Ok(el.attributes.len() != before)
    }

    /// Element expando property (`el.foo` in a browser).
    pub fn property(&self, id: NodeId, name: &str) -> Option<&serde_json::Value> {
        self.element(id).and_then(|el| el.properties.get(name))
    }

    pub fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), DomError> {
        self.element_mut(id)?
            .properties
            .insert(name.to_string(), value);
        Ok(())
    }

    /// Preorder walk of the descendants of `root`, excluding `root` itself.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }
}
