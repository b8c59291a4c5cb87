//! Virtual nodes: the per-render description of the output tree.
//!
//! A virtual tree is produced fresh for every render pass and never changes afterwards,
//! except for the cursor slot each node fills in when it is written out or when it
//! inherits the cursor of the node it replaces in a diff.

use std::collections::BTreeMap;

use tracing::trace;

use crate::{
    Result,
    backend::{Listener, NodeId, Surface},
    cursor::Cursor,
};

/// Pseudo-tag used for text nodes in the same-node test.
pub const TEXT_TAG: &str = "#text";

/// An element or text node of a virtual tree.
#[derive(Debug)]
pub enum VNode {
    /// An element with attributes, listeners and children.
    Element(VElement),
    /// A text leaf.
    Text(VText),
}

/// Element variant of [`VNode`].
#[derive(Debug)]
pub struct VElement {
    tag: String,
    attributes: BTreeMap<String, String>,
    listeners: Vec<(String, Listener)>,
    children: Vec<VNode>,
    cursor: Option<Cursor>,
}

/// Text variant of [`VNode`].
#[derive(Debug)]
pub struct VText {
    content: String,
    cursor: Option<Cursor>,
}

impl VElement {
    /// Creates an element description with no attributes, listeners or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            cursor: None,
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Adds a listener for an already normalised event name.
    #[must_use]
    pub fn listener(mut self, event: impl Into<String>, listener: Listener) -> Self {
        self.listeners.push((event.into(), listener));
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Returns the tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the attribute map.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Returns the listeners with their event names.
    #[must_use]
    pub fn listeners(&self) -> &[(String, Listener)] {
        &self.listeners
    }

    /// Returns the children in render order.
    #[must_use]
    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut [VNode] {
        &mut self.children
    }
}

impl VText {
    /// Creates a text description.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            cursor: None,
        }
    }

    /// Returns the text content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl From<VElement> for VNode {
    fn from(element: VElement) -> Self {
        Self::Element(element)
    }
}

impl From<VText> for VNode {
    fn from(text: VText) -> Self {
        Self::Text(text)
    }
}

impl VNode {
    /// Returns the tag, or [`TEXT_TAG`] for text nodes.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Element(element) => &element.tag,
            Self::Text(_) => TEXT_TAG,
        }
    }

    /// Returns the children; text nodes never have any.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Element(element) => &element.children,
            Self::Text(_) => &[],
        }
    }

    /// Returns the cursor this node occupies, once it has been written out.
    #[must_use]
    pub const fn cursor(&self) -> Option<&Cursor> {
        match self {
            Self::Element(element) => element.cursor.as_ref(),
            Self::Text(text) => text.cursor.as_ref(),
        }
    }

    /// Returns the output node this virtual node currently occupies.
    #[must_use]
    pub fn output(&self) -> Option<NodeId> {
        self.cursor().and_then(Cursor::node)
    }

    pub(crate) fn set_cursor(&mut self, cursor: Cursor) {
        match self {
            Self::Element(element) => element.cursor = Some(cursor),
            Self::Text(text) => text.cursor = Some(cursor),
        }
    }

    /// Decides whether `other` can be patched in place of `self`.
    ///
    /// Tags must match, text content must match for text nodes, and attribute maps must
    /// have the same keys with the same values. Listeners and children are not compared.
    #[must_use]
    pub fn is_same_node(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(old), Self::Text(new)) => old.content == new.content,
            (Self::Element(old), Self::Element(new)) => {
                old.tag == new.tag && old.attributes == new.attributes
            }
            _ => false,
        }
    }

    /// Produces output for this subtree and splices it into `cursor`.
    ///
    /// Children are written into the new element before the element itself replaces the
    /// cursor's previous content. Every node of the subtree records its cursor.
    ///
    /// # Errors
    ///
    /// Propagates backend failures; output written before the failure stays in place.
    pub fn write_to(&mut self, cursor: &Cursor, surface: &Surface) -> Result<()> {
        match self {
            Self::Text(text) => {
                let node = surface.create_text(&text.content);
                cursor.replace_with(surface, node)?;
                trace!(?node, "wrote text node");
            }
            Self::Element(element) => {
                let node = surface.create_element(&element.tag);
                for (key, value) in &element.attributes {
                    surface.set_attribute(node, key, value)?;
                }
                for (event, listener) in &element.listeners {
                    surface.add_listener(node, event, listener.clone())?;
                }
                for child in &mut element.children {
                    let slot = Cursor::at_end(surface, node)?;
                    child.write_to(&slot, surface)?;
                }
                cursor.replace_with(surface, node)?;
                trace!(?node, tag = %element.tag, "wrote element");
            }
        }
        self.set_cursor(cursor.clone());
        Ok(())
    }
}

/// Structural equality: tags, attributes, text and children. Listeners and cursors are
/// ignored.
impl PartialEq for VNode {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_node(other) && self.children() == other.children()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_nodes_compare_by_content() {
        let a = VNode::from(VText::new("1"));
        assert!(a.is_same_node(&VText::new("1").into()));
        assert!(!a.is_same_node(&VText::new("2").into()));
        assert_eq!(a.tag(), TEXT_TAG);
        assert!(a.children().is_empty());
    }

    #[test]
    fn listeners_do_not_affect_same_node() {
        let old = VNode::from(
            VElement::new("button")
                .attribute("class", "primary")
                .listener("click", Listener::new(|_| {})),
        );
        let new = VNode::from(
            VElement::new("button")
                .attribute("class", "primary")
                .listener("click", Listener::new(|_| {}))
                .listener("focus", Listener::new(|_| {})),
        );
        assert!(old.is_same_node(&new));
    }

    #[test]
    fn any_attribute_change_breaks_same_node() {
        let old = VNode::from(VElement::new("div").attribute("class", "x"));
        assert!(!old.is_same_node(&VElement::new("div").attribute("class", "y").into()));
        assert!(!old.is_same_node(&VElement::new("div").into()));
        assert!(
            !old.is_same_node(
                &VElement::new("div")
                    .attribute("class", "x")
                    .attribute("id", "extra")
                    .into()
            )
        );
        assert!(!old.is_same_node(&VElement::new("span").attribute("class", "x").into()));
    }

    #[test]
    fn text_never_matches_element() {
        let text = VNode::from(VText::new("div"));
        let element = VNode::from(VElement::new("div"));
        assert!(!text.is_same_node(&element));
        assert!(!element.is_same_node(&text));
    }

    #[test]
    fn same_node_ignores_children() {
        let old = VNode::from(VElement::new("ul").child(VText::new("a")));
        let new = VNode::from(VElement::new("ul"));
        assert!(old.is_same_node(&new));
        assert_ne!(old, new);
    }

    #[test]
    fn unwritten_nodes_have_no_output() {
        let node = VNode::from(VElement::new("p"));
        assert!(node.cursor().is_none());
        assert!(node.output().is_none());
    }
}
