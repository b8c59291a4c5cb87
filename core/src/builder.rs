//! Tree builder: assembles composition trees from a type, attributes and children.
//!
//! This is the target that markup sugar lowers to. Primitive tags become [`Element`]s,
//! component types are instantiated, and the children argument is flattened so that
//! nested lists splice in place, strings become [`Text`] and empty entries vanish.

use core::fmt;
use std::{collections::HashMap, rc::Rc};

use crate::{
    Error, Result,
    component::{Component, ComponentHandle},
    node::{Element, Node, Text},
    props::Attrs,
};

/// Creates component instances of one type.
#[derive(Clone)]
pub struct Factory {
    name: &'static str,
    make: Rc<dyn Fn() -> ComponentHandle>,
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Factory").field(&self.name).finish()
    }
}

impl Factory {
    /// Factory for a default-constructible component.
    #[must_use]
    pub fn of<C: Component + Default>() -> Self {
        Self::from_fn(C::default)
    }

    /// Factory from a constructor closure.
    pub fn from_fn<C: Component>(make: impl Fn() -> C + 'static) -> Self {
        Self {
            name: core::any::type_name::<C>(),
            make: Rc::new(move || ComponentHandle::new(make())),
        }
    }

    /// Returns the component's type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Instantiates a fresh component.
    #[must_use]
    pub fn instantiate(&self) -> ComponentHandle {
        (self.make)()
    }
}

/// What the builder should construct.
#[derive(Debug, Clone)]
pub enum Type {
    /// A primitive element tag.
    Tag(String),
    /// A component looked up by name in a [`Registry`].
    Named(String),
    /// A component given directly.
    Component(Factory),
}

impl Type {
    /// Shorthand for [`Type::Component`] with [`Factory::of`].
    #[must_use]
    pub fn component<C: Component + Default>() -> Self {
        Self::Component(Factory::of::<C>())
    }
}

impl From<&str> for Type {
    /// Names starting with an ASCII lowercase letter are tags; anything else names a
    /// component.
    fn from(name: &str) -> Self {
        if name.starts_with(|c: char| c.is_ascii_lowercase()) {
            Self::Tag(name.to_owned())
        } else {
            Self::Named(name.to_owned())
        }
    }
}

impl From<String> for Type {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<Factory> for Type {
    fn from(factory: Factory) -> Self {
        Self::Component(factory)
    }
}

/// A children argument: arbitrarily nested lists of nodes and strings.
#[derive(Debug, Clone)]
pub enum Child {
    /// A node appended as is.
    Node(Node),
    /// A string, wrapped into a text node.
    Text(String),
    /// A list spliced in place.
    List(Vec<Child>),
    /// Nothing; skipped.
    Empty,
}

impl Child {
    fn flatten_into(self, out: &mut Vec<Node>) {
        match self {
            Self::Node(node) => out.push(node),
            Self::Text(text) => out.push(Text::new(text).into()),
            Self::List(children) => {
                for child in children {
                    child.flatten_into(out);
                }
            }
            Self::Empty => {}
        }
    }

    /// Flattens into the sequence of nodes that get appended.
    #[must_use]
    pub fn flatten(self) -> Vec<Node> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Self::Node(element.into())
    }
}

impl From<ComponentHandle> for Child {
    fn from(component: ComponentHandle) -> Self {
        Self::Node(component.into())
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<()> for Child {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

impl<T: Into<Self>> From<Option<T>> for Child {
    fn from(child: Option<T>) -> Self {
        child.map_or(Self::Empty, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Child {
    fn from(children: Vec<T>) -> Self {
        Self::List(children.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>, const N: usize> From<[T; N]> for Child {
    fn from(children: [T; N]) -> Self {
        Self::List(children.into_iter().map(Into::into).collect())
    }
}

/// Builds a [`Child::List`] from heterogeneous children.
///
/// ```
/// use rill_core::{build, children, Attrs};
///
/// let item = build("li", Attrs::new(), "one")?;
/// let list = build("ul", Attrs::new(), children![item, vec!["two", "three"], None::<&str>])?;
/// # Ok::<(), rill_core::Error>(())
/// ```
#[macro_export]
macro_rules! children {
    ($($child:expr),* $(,)?) => {
        $crate::Child::List(::std::vec![$($crate::Child::from($child)),*])
    };
}

/// Maps component names to factories.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    components: HashMap<String, Factory>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a default-constructible component under `name`.
    pub fn register<C: Component + Default>(&mut self, name: impl Into<String>) -> &mut Self {
        self.insert(name, Factory::of::<C>())
    }

    /// Registers an arbitrary factory under `name`, replacing an earlier one.
    pub fn insert(&mut self, name: impl Into<String>, factory: Factory) -> &mut Self {
        self.components.insert(name.into(), factory);
        self
    }

    /// Returns `true` when `name` resolves.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Builds a node of type `ty`, applies `attrs` in order and appends the flattened
    /// `children`. Nothing is rendered or mounted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] for a name with no registered component and
    /// [`Error::InvalidListenerKey`] for a listener under a non-event key on an element.
    pub fn build(
        &self,
        ty: impl Into<Type>,
        attrs: impl Into<Attrs>,
        children: impl Into<Child>,
    ) -> Result<Node> {
        let attrs = attrs.into();
        let children = children.into().flatten();
        match ty.into() {
            Type::Tag(tag) => {
                let mut element = Element::new(tag);
                for (key, value) in attrs {
                    element.set_attribute(key, value)?;
                }
                for child in children {
                    element.append_child(child);
                }
                Ok(element.into())
            }
            Type::Named(name) => {
                let factory = self
                    .components
                    .get(&name)
                    .ok_or(Error::UnknownType(name))?;
                Ok(Self::compose(factory, attrs, children))
            }
            Type::Component(factory) => Ok(Self::compose(&factory, attrs, children)),
        }
    }

    fn compose(factory: &Factory, attrs: Attrs, children: Vec<Node>) -> Node {
        let component = factory.instantiate();
        for (key, value) in attrs {
            component.set_attribute(key, value);
        }
        for child in children {
            component.append_child(child);
        }
        component.into()
    }
}

/// Builds a node without any named components; see [`Registry::build`].
///
/// # Errors
///
/// Returns [`Error::UnknownType`] for any [`Type::Named`] target.
pub fn build(
    ty: impl Into<Type>,
    attrs: impl Into<Attrs>,
    children: impl Into<Child>,
) -> Result<Node> {
    Registry::new().build(ty, attrs, children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backend::Listener, component::Scope, vnode::VNode};
    use serde_json::json;

    #[derive(Default)]
    struct Badge;

    impl Component for Badge {
        fn render(&self, scope: &Scope<'_>) -> Result<Node> {
            let label = scope.prop("label").cloned().unwrap_or_default();
            build("span", [("class", "badge")], label.as_str().unwrap_or("?"))
        }
    }

    fn texts(node: &VNode) -> Vec<String> {
        node.children()
            .iter()
            .map(|child| match child {
                VNode::Text(text) => text.content().to_owned(),
                VNode::Element(element) => element.tag().to_owned(),
            })
            .collect()
    }

    #[test]
    fn nested_children_flatten_in_order() {
        let node = build(
            "div",
            (),
            children![
                "a",
                vec![Child::from("b"), Child::from(vec!["c", "d"])],
                None::<&str>,
                (),
                build("hr", (), ()).unwrap(),
                Some("e"),
            ],
        )
        .unwrap();
        let tree = node.to_virtual_node().unwrap();
        assert_eq!(texts(&tree), ["a", "b", "c", "d", "hr", "e"]);
    }

    #[test]
    fn lowercase_names_are_tags() {
        assert!(matches!(Type::from("div"), Type::Tag(tag) if tag == "div"));
        assert!(matches!(Type::from("Badge"), Type::Named(name) if name == "Badge"));
        assert!(matches!(Type::from(""), Type::Named(name) if name.is_empty()));
    }

    #[test]
    fn unknown_component_is_an_error() {
        let error = build("Missing", (), ()).unwrap_err();
        assert!(matches!(error, Error::UnknownType(name) if name == "Missing"));
    }

    #[test]
    fn registered_component_builds_with_props() {
        let mut registry = Registry::new();
        registry.register::<Badge>("Badge");
        assert!(registry.contains("Badge"));

        let node = registry
            .build("Badge", [("label", json!("new"))], ())
            .unwrap();
        let Node::Component(handle) = &node else {
            panic!("expected a component");
        };
        assert_eq!(handle.props().value("label"), Some(&json!("new")));

        let tree = node.to_virtual_node().unwrap();
        assert_eq!(tree.tag(), "span");
        assert_eq!(texts(&tree), ["new"]);
    }

    #[test]
    fn typed_component_needs_no_registry() {
        let node = build(Type::component::<Badge>(), (), ()).unwrap();
        assert_eq!(node.to_virtual_node().unwrap().tag(), "span");
    }

    #[test]
    fn component_children_are_kept_for_render() {
        let node = build(Type::component::<Badge>(), (), children!["x", "y"]).unwrap();
        let Node::Component(handle) = node else {
            panic!("expected a component");
        };
        let tree = handle.to_virtual_node().unwrap();
        assert_eq!(tree.children().len(), 1);
    }

    #[test]
    fn element_listener_keys_are_validated() {
        let attrs = Attrs::new().with("click", Listener::new(|_| {}));
        let error = build("button", attrs, ()).unwrap_err();
        assert!(matches!(error, Error::InvalidListenerKey(key) if key == "click"));
    }
}
