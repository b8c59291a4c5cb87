use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use rill_core::{Backend, BackendError, Listener, NodeId, Surface};
use tracing::trace;

use crate::snapshot::Snapshot;

/// Tag of the container every document starts with.
pub const ROOT_TAG: &str = "#document";

#[derive(Debug)]
enum NodeKind {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        listeners: Vec<(String, Listener)>,
    },
    Text(String),
}

#[derive(Debug)]
struct NodeEntry {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl NodeEntry {
    const fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            kind,
        }
    }
}

/// Arena-backed output tree.
///
/// Nodes are never freed; a node removed from the tree simply becomes detached and keeps
/// its identifier, so that stale identifiers held by callers stay valid for inspection.
/// Detached nodes keep their attributes and listeners too, so a document that is updated
/// for a long time grows with every replaced subtree. [`MemoryDocument::len`] counts
/// detached nodes as well as attached ones.
#[derive(Debug)]
pub struct MemoryDocument {
    nodes: Vec<NodeEntry>,
    root: NodeId,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Creates a document holding only an empty root container.
    #[must_use]
    pub fn new() -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            root: NodeId::new(0),
        };
        document.root = document.push(NodeKind::Element {
            tag: ROOT_TAG.to_owned(),
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
        });
        document
    }

    /// Creates a shared document together with a [`Surface`] over it.
    ///
    /// The returned `Rc` stays usable for inspection while the surface drives rendering.
    #[must_use]
    pub fn shared() -> (Rc<RefCell<Self>>, Surface) {
        let document = Rc::new(RefCell::new(Self::new()));
        let surface = Surface::new(document.clone());
        (document, surface)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeEntry::new(kind));
        id
    }

    fn entry(&self, id: NodeId) -> Result<&NodeEntry, BackendError> {
        self.nodes
            .get(id.index())
            .ok_or(BackendError::UnknownNode(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry, BackendError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(BackendError::UnknownNode(id))
    }

    fn ensure_element(&self, id: NodeId) -> Result<(), BackendError> {
        match self.entry(id)?.kind {
            NodeKind::Element { .. } => Ok(()),
            NodeKind::Text(_) => Err(BackendError::NotAnElement(id)),
        }
    }

    /// Returns `true` when `ancestor` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id.index()).and_then(|entry| entry.parent);
        }
        false
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.index()].parent.take() else {
            return;
        };
        self.nodes[parent.index()]
            .children
            .retain(|&child| child != node);
    }

    fn position(&self, parent: NodeId, child: NodeId) -> Result<usize, BackendError> {
        self.nodes[parent.index()]
            .children
            .iter()
            .position(|&id| id == child)
            .ok_or(BackendError::NotAChild {
                node: child,
                parent,
            })
    }

    /// Returns the root container.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Returns how many nodes were ever created, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `false`; the root container always exists.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` when `id` was issued by this document.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Returns the tag of an element, or `None` for text and unknown nodes.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.index())?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Returns the content of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.index())?.kind {
            NodeKind::Text(content) => Some(content),
            NodeKind::Element { .. } => None,
        }
    }

    /// Returns one attribute of an element.
    #[must_use]
    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.attributes(id)?.get(key).map(String::as_str)
    }

    /// Returns every attribute of an element.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> Option<&BTreeMap<String, String>> {
        match &self.nodes.get(id.index())?.kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            NodeKind::Text(_) => None,
        }
    }

    /// Returns the children of a node; empty for text and unknown nodes.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map_or(&[], |entry| entry.children.as_slice())
    }

    /// Returns `true` when `id` is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_inclusive_ancestor(self.root, id)
    }

    /// Finds the first element tagged `tag` below `from` (inclusive), in document order.
    #[must_use]
    pub fn find_element(&self, from: NodeId, tag: &str) -> Option<NodeId> {
        if self.tag(from) == Some(tag) {
            return Some(from);
        }
        self.children(from)
            .iter()
            .find_map(|&child| self.find_element(child, tag))
    }

    /// Concatenates the text of every text node below `id`, in document order.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(content) = self.text(id) {
            out.push_str(content);
        }
        for &child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    /// Captures the subtree rooted at `id`.
    #[must_use]
    pub fn snapshot(&self, id: NodeId) -> Option<Snapshot> {
        let entry = self.nodes.get(id.index())?;
        Some(match &entry.kind {
            NodeKind::Text(content) => Snapshot::Text {
                content: content.clone(),
            },
            NodeKind::Element {
                tag, attributes, ..
            } => Snapshot::Element {
                tag: tag.clone(),
                attributes: attributes.clone(),
                children: entry
                    .children
                    .iter()
                    .filter_map(|&child| self.snapshot(child))
                    .collect(),
            },
        })
    }

    /// Serialises the children of `id` as markup, the way they would appear inside it.
    #[must_use]
    pub fn inner_markup(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|&child| self.snapshot(child))
            .map(|snapshot| snapshot.to_markup())
            .collect()
    }
}

impl Backend for MemoryDocument {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_owned(),
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
        })
    }

    fn create_text(&mut self, content: &str) -> NodeId {
        self.push(NodeKind::Text(content.to_owned()))
    }

    fn set_attribute(&mut self, node: NodeId, key: &str, value: &str) -> Result<(), BackendError> {
        match &mut self.entry_mut(node)?.kind {
            NodeKind::Element { attributes, .. } => {
                attributes.insert(key.to_owned(), value.to_owned());
                Ok(())
            }
            NodeKind::Text(_) => Err(BackendError::NotAnElement(node)),
        }
    }

    fn remove_attribute(&mut self, node: NodeId, key: &str) -> Result<(), BackendError> {
        match &mut self.entry_mut(node)?.kind {
            NodeKind::Element { attributes, .. } => {
                attributes.remove(key);
                Ok(())
            }
            NodeKind::Text(_) => Err(BackendError::NotAnElement(node)),
        }
    }

    fn add_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: Listener,
    ) -> Result<(), BackendError> {
        match &mut self.entry_mut(node)?.kind {
            NodeKind::Element { listeners, .. } => {
                listeners.push((event.to_owned(), listener));
                Ok(())
            }
            NodeKind::Text(_) => Err(BackendError::NotAnElement(node)),
        }
    }

    fn listeners(&self, node: NodeId, event: &str) -> Result<Vec<Listener>, BackendError> {
        Ok(match &self.entry(node)?.kind {
            NodeKind::Element { listeners, .. } => listeners
                .iter()
                .filter(|(name, _)| name == event)
                .map(|(_, listener)| listener.clone())
                .collect(),
            NodeKind::Text(_) => Vec::new(),
        })
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, BackendError> {
        Ok(self.entry(node)?.parent)
    }

    fn last_child(&self, node: NodeId) -> Result<Option<NodeId>, BackendError> {
        Ok(self.entry(node)?.children.last().copied())
    }

    fn insert_after(
        &mut self,
        parent: NodeId,
        after: Option<NodeId>,
        node: NodeId,
    ) -> Result<(), BackendError> {
        self.entry(node)?;
        self.ensure_element(parent)?;
        if self.is_inclusive_ancestor(node, parent) {
            return Err(BackendError::Cycle { node, parent });
        }
        if let Some(anchor) = after {
            if self.entry(anchor)?.parent != Some(parent) {
                return Err(BackendError::NotAChild {
                    node: anchor,
                    parent,
                });
            }
            if anchor == node {
                return Ok(());
            }
        }

        self.detach(node);
        let index = match after {
            Some(anchor) => self.position(parent, anchor)? + 1,
            None => 0,
        };
        self.nodes[parent.index()].children.insert(index, node);
        self.nodes[node.index()].parent = Some(parent);
        trace!(?parent, ?node, index, "inserted node");
        Ok(())
    }

    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), BackendError> {
        self.entry(new)?;
        let parent = self.entry(old)?.parent.ok_or(BackendError::Detached(old))?;
        if old == new {
            return Ok(());
        }
        if self.is_inclusive_ancestor(new, parent) {
            return Err(BackendError::Cycle { node: new, parent });
        }

        self.detach(new);
        let index = self.position(parent, old)?;
        self.nodes[parent.index()].children[index] = new;
        self.nodes[new.index()].parent = Some(parent);
        self.nodes[old.index()].parent = None;
        trace!(?parent, ?old, ?new, "replaced node");
        Ok(())
    }

    fn clear(&mut self, container: NodeId) -> Result<(), BackendError> {
        let children = core::mem::take(&mut self.entry_mut(container)?.children);
        for child in &children {
            self.nodes[child.index()].parent = None;
        }
        trace!(?container, removed = children.len(), "cleared container");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn document_with_list() -> (MemoryDocument, NodeId, [NodeId; 3]) {
        let mut document = MemoryDocument::new();
        let list = document.create_element("ul");
        let root = document.root();
        document.insert_after(root, None, list).unwrap();
        let a = document.create_text("a");
        let b = document.create_text("b");
        let c = document.create_text("c");
        document.insert_after(list, None, a).unwrap();
        document.insert_after(list, Some(a), c).unwrap();
        document.insert_after(list, Some(a), b).unwrap();
        (document, list, [a, b, c])
    }

    #[test]
    fn insert_after_orders_children() {
        let (document, list, [a, b, c]) = document_with_list();
        assert_eq!(document.children(list), [a, b, c]);
        assert_eq!(document.text_content(list), "abc");
        assert_eq!(document.parent(b).unwrap(), Some(list));
        assert!(document.is_attached(c));
    }

    #[test]
    fn insert_moves_an_attached_node() {
        let (mut document, list, [a, b, c]) = document_with_list();
        document.insert_after(list, Some(c), a).unwrap();
        assert_eq!(document.children(list), [b, c, a]);
        document.insert_after(list, None, a).unwrap();
        assert_eq!(document.children(list), [a, b, c]);
    }

    #[test]
    fn insert_rejects_foreign_anchor_and_text_parent() {
        let (mut document, list, [a, _, _]) = document_with_list();
        let stray = document.create_text("x");
        let other = document.create_text("y");
        assert_eq!(
            document.insert_after(list, Some(stray), other),
            Err(BackendError::NotAChild {
                node: stray,
                parent: list
            })
        );
        assert_eq!(
            document.insert_after(a, None, other),
            Err(BackendError::NotAnElement(a))
        );
        assert_eq!(
            document.insert_after(list, None, NodeId::new(99)),
            Err(BackendError::UnknownNode(NodeId::new(99)))
        );
    }

    #[test]
    fn insert_rejects_cycles() {
        let (mut document, list, _) = document_with_list();
        let inner = document.create_element("li");
        document.insert_after(list, None, inner).unwrap();
        assert_eq!(
            document.insert_after(inner, None, list),
            Err(BackendError::Cycle {
                node: list,
                parent: inner
            })
        );
        assert_eq!(
            document.insert_after(list, None, list),
            Err(BackendError::Cycle {
                node: list,
                parent: list
            })
        );
    }

    #[test]
    fn replace_swaps_in_place() {
        let (mut document, list, [a, b, c]) = document_with_list();
        let fresh = document.create_element("li");
        document.replace(b, fresh).unwrap();
        assert_eq!(document.children(list), [a, fresh, c]);
        assert_eq!(document.parent(b).unwrap(), None);
        assert!(!document.is_attached(b));
    }

    #[test]
    fn replaced_nodes_stay_inspectable() {
        let (mut document, list, [a, b, c]) = document_with_list();
        let size = document.len();
        document.set_attribute(list, "class", "old").unwrap();
        let fresh = document.create_element("ol");
        let root = document.root();
        document.replace(list, fresh).unwrap();

        assert_eq!(document.len(), size + 1);
        assert_eq!(document.children(root), [fresh]);
        assert!(!document.is_attached(list));
        assert!(!document.is_attached(b));
        assert_eq!(document.attribute(list, "class"), Some("old"));
        assert_eq!(document.children(list), [a, b, c]);
    }

    #[test]
    fn replace_with_a_sibling_moves_it() {
        let (mut document, list, [a, b, c]) = document_with_list();
        document.replace(a, c).unwrap();
        assert_eq!(document.children(list), [c, b]);
        assert_eq!(document.parent(a).unwrap(), None);
    }

    #[test]
    fn replace_needs_an_attached_node() {
        let mut document = MemoryDocument::new();
        let old = document.create_text("old");
        let new = document.create_text("new");
        assert_eq!(document.replace(old, new), Err(BackendError::Detached(old)));
    }

    #[test]
    fn clear_detaches_children() {
        let (mut document, list, [a, b, c]) = document_with_list();
        document.clear(list).unwrap();
        assert!(document.children(list).is_empty());
        for node in [a, b, c] {
            assert_eq!(document.parent(node).unwrap(), None);
        }
        assert_eq!(document.len(), 5);
    }

    #[test]
    fn attributes_only_on_elements() {
        let (mut document, list, [a, _, _]) = document_with_list();
        document.set_attribute(list, "class", "items").unwrap();
        assert_eq!(document.attribute(list, "class"), Some("items"));
        document.remove_attribute(list, "class").unwrap();
        document.remove_attribute(list, "class").unwrap();
        assert_eq!(document.attribute(list, "class"), None);
        assert_eq!(
            document.set_attribute(a, "class", "x"),
            Err(BackendError::NotAnElement(a))
        );
    }

    #[test]
    fn dispatch_runs_matching_listeners() {
        let (document, surface) = MemoryDocument::shared();
        let button = surface.create_element("button");
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        surface
            .add_listener(
                button,
                "click",
                Listener::new(move |_| counter.set(counter.get() + 1)),
            )
            .unwrap();
        surface
            .add_listener(button, "focus", Listener::new(|_| {}))
            .unwrap();

        assert_eq!(surface.dispatch(button, "click").unwrap(), 1);
        assert_eq!(surface.dispatch(button, "blur").unwrap(), 0);
        assert_eq!(hits.get(), 1);
        assert_eq!(document.borrow().listeners(button, "focus").unwrap().len(), 1);
    }

    #[test]
    fn find_element_searches_in_document_order() {
        let (mut document, list, [a, _, _]) = document_with_list();
        let item = document.create_element("li");
        document.insert_after(list, Some(a), item).unwrap();
        let root = document.root();
        assert_eq!(document.find_element(root, "li"), Some(item));
        assert_eq!(document.find_element(root, "ul"), Some(list));
        assert_eq!(document.find_element(item, "ul"), None);
    }

    #[test]
    fn markup_of_nested_tree() {
        let (mut document, list, _) = document_with_list();
        document.set_attribute(list, "id", "x").unwrap();
        let root = document.root();
        assert_eq!(document.inner_markup(root), r#"<ul id="x">abc</ul>"#);
    }
}
