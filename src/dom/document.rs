//! Content documents.
//!
//! A document owns an arena of nodes addressed by [`NodeId`]. The body is
//! the root of the visible tree; nodes that were moved to another document
//! leave an empty slot behind and are no longer reachable.

use std::collections::HashMap;

use super::node::{Element, ElementKind, Node, NodeId};
use crate::config::SplitPolicy;
use crate::error::{Error, Result};
use crate::publication::{ResourceRef, XRefId};

/// Handle of a document within its publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u32);

#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) node: Node,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// An XHTML content document.
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    name: String,
    slots: Vec<Option<Slot>>,
    body: NodeId,
    /// Identifier map (`id` attribute -> element).
    ids: HashMap<String, NodeId>,
    next_generated_id: u32,
    stylesheets: Vec<ResourceRef>,
    pub(crate) root_ref: Option<XRefId>,
    /// Name of the document this one was split off from, through any
    /// number of continuations.
    pub(crate) split_from: Option<String>,
    pub title: Option<String>,
    pub lang: Option<String>,
}

impl Document {
    /// Create an empty document with a `body` element.
    pub fn new(id: DocumentId, name: impl Into<String>) -> Self {
        let mut doc = Self {
            id,
            name: name.into(),
            slots: Vec::new(),
            body: NodeId(0),
            ids: HashMap::new(),
            next_generated_id: 1,
            stylesheets: Vec::new(),
            root_ref: None,
            split_from: None,
            title: None,
            lang: None,
        };
        doc.body = doc.alloc(Node::Element(Element::new(ElementKind::Body)));
        doc
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Resource name (path within the package).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Cross-reference pointing at the start of this document.
    pub fn root_ref(&self) -> Option<XRefId> {
        self.root_ref
    }

    pub fn stylesheets(&self) -> &[ResourceRef] {
        &self.stylesheets
    }

    pub fn add_stylesheet(&mut self, stylesheet: ResourceRef) {
        if !self.stylesheets.contains(&stylesheet) {
            self.stylesheets.push(stylesheet);
        }
    }

    /// Drop every stylesheet link (before relinking generated styles).
    pub fn clear_stylesheets(&mut self) {
        self.stylesheets.clear();
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(Slot {
            node,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    pub(crate) fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Remove a node's slot, leaving the handle dangling.
    pub(crate) fn take_slot(&mut self, id: NodeId) -> Option<Slot> {
        self.slots.get_mut(id.0 as usize).and_then(Option::take)
    }

    fn invalid(&self, id: NodeId) -> Error {
        Error::InvalidNode {
            document: self.name.clone(),
            node: id.0,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slot(id).map(|slot| &slot.node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slot_mut(id).map(|slot| &mut slot.node)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.node_mut(id).and_then(Node::as_element_mut)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|slot| slot.parent)
    }

    /// Children in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|slot| slot.children.as_slice()).unwrap_or(&[])
    }

    /// Allocate a detached node.
    pub fn create(&mut self, node: Node) -> NodeId {
        self.alloc(node)
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        match self.slot(parent) {
            Some(slot) if matches!(slot.node, Node::Element(_)) => {}
            Some(_) => return Err(Error::NotAnElement(parent.0)),
            None => return Err(self.invalid(parent)),
        }
        match self.slot_mut(child) {
            Some(slot) => slot.parent = Some(parent),
            None => return Err(self.invalid(child)),
        }
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.push(child);
        }
        Ok(())
    }

    /// Create an element and append it to `parent`.
    ///
    /// An `id` already set on the element is registered in the identifier map.
    pub fn add_element(&mut self, parent: NodeId, element: Element) -> Result<NodeId> {
        let explicit_id = element.id.clone();
        let id = self.alloc(Node::Element(element));
        self.append_child(parent, id)?;
        if let Some(explicit_id) = explicit_id {
            self.ids.insert(explicit_id, id);
        }
        Ok(id)
    }

    /// Append a text run to `parent`.
    pub fn add_text(&mut self, parent: NodeId, text: impl Into<String>) -> Result<NodeId> {
        let id = self.alloc(Node::Text(text.into()));
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Set an explicit identifier, replacing any previous one.
    pub fn set_id(&mut self, node: NodeId, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        let element = self.element_mut(node).ok_or(Error::NotAnElement(node.0))?;
        let previous = element.id.replace(id.clone());
        if let Some(previous) = previous {
            self.ids.remove(&previous);
        }
        self.ids.insert(id, node);
        Ok(())
    }

    /// Look up an element by identifier.
    pub fn lookup_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Return the element's identifier, generating `id<n>` on first use.
    ///
    /// Generated names skip identifiers already present in the document.
    pub fn assign_id(&mut self, node: NodeId) -> Result<String> {
        let element = self.element(node).ok_or(Error::NotAnElement(node.0))?;
        if let Some(id) = &element.id {
            return Ok(id.clone());
        }

        let mut candidate = format!("id{}", self.next_generated_id);
        while self.ids.contains_key(&candidate) {
            self.next_generated_id += 1;
            candidate = format!("id{}", self.next_generated_id);
        }
        self.next_generated_id += 1;

        if let Some(element) = self.element_mut(node) {
            element.id = Some(candidate.clone());
        }
        self.ids.insert(candidate.clone(), node);
        Ok(candidate)
    }

    /// Forget an identifier (its element is leaving the document).
    pub(crate) fn unregister_id(&mut self, id: &str) {
        self.ids.remove(id);
    }

    pub(crate) fn register_id(&mut self, id: String, node: NodeId) {
        self.ids.insert(id, node);
    }

    /// Append without validation; both handles come from this document.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.push(child);
        }
    }

    /// Drop every child of `parent` from index `keep` on (the nodes themselves
    /// must already have been moved away).
    pub(crate) fn truncate_children(&mut self, parent: NodeId, keep: usize) {
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.truncate(keep);
        }
    }

    /// Make a detached element the new body, discarding the old (empty) one.
    pub(crate) fn replace_body(&mut self, body: NodeId) {
        let old = self.body;
        if old != body && self.children(old).is_empty() {
            self.take_slot(old);
        }
        self.body = body;
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        for id in self.iter_dfs(node) {
            if let Some(Node::Text(run)) = self.node(id) {
                text.push_str(run);
            }
        }
        text
    }

    /// Depth-first pre-order traversal starting at `root`.
    pub fn iter_dfs(&self, root: NodeId) -> DfsIter<'_> {
        DfsIter {
            document: self,
            stack: vec![root],
        }
    }

    /// Serialized overhead of the element alone (tags and attributes).
    pub fn element_size(&self, node: NodeId, policy: &SplitPolicy) -> i64 {
        let Some(element) = self.element(node) else {
            return 0;
        };
        let tag = element.tag_name().len() as i64;
        let mut size = 2 * tag + policy.element_overhead;
        for (name, value) in element.attributes() {
            size += (name.len() + value.len()) as i64 + policy.attribute_overhead;
        }
        if let ElementKind::Hyperlink(link) = &element.kind
            && link.target.is_some()
        {
            size += policy.internal_link_bytes;
        }
        size
    }

    /// Approximate serialized size of a subtree.
    pub fn estimated_size(&self, node: NodeId, policy: &SplitPolicy) -> i64 {
        match self.node(node) {
            Some(Node::Text(text)) => text.len() as i64,
            Some(Node::Element(_)) => {
                let mut size = self.element_size(node, policy);
                for &child in self.children(node) {
                    size += self.estimated_size(child, policy) + policy.separator;
                }
                size
            }
            None => 0,
        }
    }

    /// Approximate serialized size of the body.
    pub fn estimated_document_size(&self, policy: &SplitPolicy) -> i64 {
        self.estimated_size(self.body, policy)
    }
}

/// Depth-first iterator over a subtree.
pub struct DfsIter<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for DfsIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order so they're visited left-to-right
        self.stack
            .extend(self.document.children(current).iter().rev().copied());
        Some(current)
    }
}
