//! Composition tree produced by the tree builder.
//!
//! A [`Node`] is what user code assembles: elements, text and stateful components. It is
//! turned into a virtual tree by [`Node::to_virtual_node`] (pure) and written into an
//! output region by [`Node::write_to`] (effectful).

use crate::{
    Error, Result,
    backend::Surface,
    component::ComponentHandle,
    cursor::Cursor,
    props::{PropValue, Props, attribute_text, event_name},
    vnode::{VElement, VNode, VText},
};

/// A node of the composition tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// A primitive element.
    Element(Element),
    /// A text leaf.
    Text(Text),
    /// A stateful component instance.
    Component(ComponentHandle),
}

/// Primitive element wrapper: a tag with props and composed children.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    props: Props,
    children: Vec<Node>,
}

/// Text leaf wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    content: String,
}

impl Element {
    /// Creates an element with no props or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: Props::new(),
            children: Vec::new(),
        }
    }

    /// Returns the tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the props set so far.
    #[must_use]
    pub const fn props(&self) -> &Props {
        &self.props
    }

    /// Returns the composed children.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Stores a prop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidListenerKey`] when a listener is stored under a key that
    /// does not name an event.
    pub fn set_attribute(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropValue>,
    ) -> Result<()> {
        let key = key.into();
        let value = value.into();
        if matches!(value, PropValue::Listener(_)) && event_name(&key).is_none() {
            return Err(Error::InvalidListenerKey(key));
        }
        self.props.set(key, value);
        Ok(())
    }

    /// Appends a child.
    pub fn append_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Resolves this element and its children into a virtual element.
    ///
    /// # Errors
    ///
    /// Propagates failures from rendering nested components.
    pub fn to_virtual_node(&self) -> Result<VNode> {
        let mut element = VElement::new(self.tag.as_str());
        for (key, value) in self.props.iter() {
            match value {
                PropValue::Value(value) => {
                    element = element.attribute(key, attribute_text(value));
                }
                PropValue::Listener(listener) => {
                    if let Some(event) = event_name(key) {
                        element = element.listener(event, listener.clone());
                    }
                }
            }
        }
        for child in &self.children {
            element = element.child(child.to_virtual_node()?);
        }
        Ok(element.into())
    }
}

impl Text {
    /// Creates a text leaf.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Returns the text content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Self::Text(text)
    }
}

impl From<ComponentHandle> for Node {
    fn from(component: ComponentHandle) -> Self {
        Self::Component(component)
    }
}

impl Node {
    /// Produces the virtual tree for this node. Components render with their current
    /// props and state; identical inputs give structurally equal trees.
    ///
    /// # Errors
    ///
    /// Propagates failures from component render functions.
    pub fn to_virtual_node(&self) -> Result<VNode> {
        match self {
            Self::Element(element) => element.to_virtual_node(),
            Self::Text(text) => Ok(VText::new(text.content.as_str()).into()),
            Self::Component(component) => component.to_virtual_node(),
        }
    }

    /// Renders this node into `cursor`. A component additionally takes ownership of the
    /// cursor and remembers the tree it wrote, so that it can reconcile later.
    ///
    /// # Errors
    ///
    /// Propagates render and backend failures.
    pub fn write_to(&self, cursor: &Cursor, surface: &Surface) -> Result<()> {
        match self {
            Self::Component(component) => component.write_to(cursor, surface),
            other => other.to_virtual_node()?.write_to(cursor, surface),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Listener;

    #[test]
    fn listeners_split_from_attributes() {
        let mut element = Element::new("button");
        element.set_attribute("class", "primary").unwrap();
        element.set_attribute("disabled", false).unwrap();
        element
            .set_attribute("onClick", Listener::new(|_| {}))
            .unwrap();
        element.append_child(Text::new("go"));

        let VNode::Element(vnode) = element.to_virtual_node().unwrap() else {
            panic!("expected an element");
        };
        assert_eq!(vnode.attributes().len(), 2);
        assert_eq!(vnode.attributes()["class"], "primary");
        assert_eq!(vnode.attributes()["disabled"], "false");
        assert_eq!(vnode.listeners().len(), 1);
        assert_eq!(vnode.listeners()[0].0, "click");
        assert_eq!(vnode.children().len(), 1);
    }

    #[test]
    fn listener_needs_event_key() {
        let mut element = Element::new("div");
        let error = element
            .set_attribute("handler", Listener::new(|_| {}))
            .unwrap_err();
        assert!(matches!(error, Error::InvalidListenerKey(key) if key == "handler"));
        assert!(element.props().is_empty());
    }

    #[test]
    fn on_prefixed_data_is_an_attribute() {
        let mut element = Element::new("div");
        element.set_attribute("online", "yes").unwrap();
        let VNode::Element(vnode) = element.to_virtual_node().unwrap() else {
            panic!("expected an element");
        };
        assert_eq!(vnode.attributes()["online"], "yes");
        assert!(vnode.listeners().is_empty());
    }
}
