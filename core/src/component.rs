//! Stateful components.
//!
//! User code implements [`Component`]; the framework keeps the instance data (props,
//! children, state and, once mounted, the owned cursor and last rendered tree) behind a
//! [`ComponentHandle`].

use core::{any::type_name, fmt};
use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use serde_json::Value;
use tracing::debug;

use crate::{
    Error, Result,
    backend::Surface,
    cursor::Cursor,
    node::Node,
    props::{PropValue, Props},
    reconcile::{ReconcileStats, reconcile},
    state::merge_state,
    vnode::VNode,
};

static NULL: Value = Value::Null;

/// Behaviour of a stateful component.
pub trait Component: 'static {
    /// Builds the composition tree for the current props and state.
    ///
    /// Must be pure with respect to the scope: the same props and state give an
    /// equivalent tree.
    ///
    /// # Errors
    ///
    /// Typically propagates tree builder failures.
    fn render(&self, scope: &Scope<'_>) -> Result<Node>;

    /// State the instance starts with. `None` means no state until the first `set_state`.
    fn initial_state(&self) -> Option<Value> {
        None
    }
}

/// Read access to an instance during [`Component::render`].
#[derive(Debug)]
pub struct Scope<'a> {
    instance: &'a Instance,
    handle: &'a ComponentHandle,
}

impl Scope<'_> {
    /// Returns every prop set by the builder.
    #[must_use]
    pub const fn props(&self) -> &Props {
        &self.instance.props
    }

    /// Returns the data prop stored under `key`.
    #[must_use]
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.instance.props.value(key)
    }

    /// Returns the children composed into this component by its parent.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.instance.children
    }

    /// Returns the current state, or `Value::Null` before any state exists.
    #[must_use]
    pub fn state(&self) -> &Value {
        self.instance.state.as_ref().unwrap_or(&NULL)
    }

    /// Returns a strong handle to the instance being rendered.
    #[must_use]
    pub fn handle(&self) -> ComponentHandle {
        self.handle.clone()
    }

    /// Returns a weak handle, suitable for capturing in listeners without keeping the
    /// instance alive through its own output.
    #[must_use]
    pub fn weak_handle(&self) -> WeakComponentHandle {
        self.handle.downgrade()
    }
}

struct Instance {
    name: &'static str,
    behaviour: Box<dyn Component>,
    props: Props,
    children: Vec<Node>,
    state: Option<Value>,
    mounted: Option<Mounted>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("props", &self.props)
            .field("children", &self.children.len())
            .field("state", &self.state)
            .field("mounted", &self.mounted.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct Mounted {
    cursor: Cursor,
    tree: VNode,
    surface: Surface,
}

/// Shared handle to a component instance.
#[derive(Clone)]
pub struct ComponentHandle(Rc<RefCell<Instance>>);

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(instance) => fmt::Debug::fmt(&*instance, f),
            Err(_) => f.write_str("ComponentHandle(<rendering>)"),
        }
    }
}

impl ComponentHandle {
    /// Instantiates `component` with empty props and children.
    pub fn new<C: Component>(component: C) -> Self {
        let state = component.initial_state();
        Self(Rc::new(RefCell::new(Instance {
            name: type_name::<C>(),
            behaviour: Box::new(component),
            props: Props::new(),
            children: Vec::new(),
            state,
            mounted: None,
        })))
    }

    /// Returns the component's type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.0.borrow().name
    }

    /// Stores a prop. Meant for composition time, before the first render.
    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<PropValue>) {
        self.0.borrow_mut().props.set(key, value);
    }

    /// Appends a composed child. Meant for composition time, before the first render.
    pub fn append_child(&self, child: impl Into<Node>) {
        self.0.borrow_mut().children.push(child.into());
    }

    /// Returns a copy of the props.
    #[must_use]
    pub fn props(&self) -> Props {
        self.0.borrow().props.clone()
    }

    /// Returns a copy of the current state, `Value::Null` before any state exists.
    #[must_use]
    pub fn state(&self) -> Value {
        self.0.borrow().state.clone().unwrap_or(Value::Null)
    }

    /// Returns `true` once the instance owns an output region.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.0.borrow().mounted.is_some()
    }

    /// Returns the cursor of the output region this instance owns.
    #[must_use]
    pub fn cursor(&self) -> Option<Cursor> {
        self.0.borrow().mounted.as_ref().map(|mounted| mounted.cursor.clone())
    }

    /// Runs `f` against the last rendered virtual tree, if mounted.
    pub fn with_tree<R>(&self, f: impl FnOnce(&VNode) -> R) -> Option<R> {
        self.0.borrow().mounted.as_ref().map(|mounted| f(&mounted.tree))
    }

    /// Creates a weak handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakComponentHandle {
        WeakComponentHandle(Rc::downgrade(&self.0))
    }

    /// Returns `true` when both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Renders the instance and resolves the result into a virtual tree.
    ///
    /// # Errors
    ///
    /// Propagates failures from the render function.
    pub fn to_virtual_node(&self) -> Result<VNode> {
        let node = {
            let instance = self.0.borrow();
            let scope = Scope {
                instance: &instance,
                handle: self,
            };
            instance.behaviour.render(&scope)?
        };
        node.to_virtual_node()
    }

    /// First render into `cursor`: the instance takes the cursor and remembers the tree.
    pub(crate) fn write_to(&self, cursor: &Cursor, surface: &Surface) -> Result<()> {
        let mut tree = self.to_virtual_node()?;
        tree.write_to(cursor, surface)?;
        self.0.borrow_mut().mounted = Some(Mounted {
            cursor: cursor.clone(),
            tree,
            surface: surface.clone(),
        });
        Ok(())
    }

    /// Merges `patch` into the state and reconciles the output against the new tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotMounted`] when the instance owns no output region (the patch is
    /// still merged), or propagates render and backend failures. Output already updated
    /// before a failure is not rolled back.
    pub fn set_state(&self, patch: Value) -> Result<ReconcileStats> {
        merge_state(&mut self.0.borrow_mut().state, patch);
        self.update()
    }

    /// Re-renders with the current props and state and reconciles the output.
    ///
    /// # Errors
    ///
    /// Same as [`ComponentHandle::set_state`].
    pub fn update(&self) -> Result<ReconcileStats> {
        let name = self.name();
        let Some(mounted) = self.0.borrow_mut().mounted.take() else {
            return Err(Error::NotMounted(name));
        };
        let result = self
            .to_virtual_node()
            .and_then(|mut tree| {
                reconcile(&mounted.tree, &mut tree, &mounted.surface).map(|stats| (tree, stats))
            });
        match result {
            Ok((tree, stats)) => {
                debug!(component = name, ?stats, "state update reconciled");
                self.0.borrow_mut().mounted = Some(Mounted { tree, ..mounted });
                Ok(stats)
            }
            Err(error) => {
                self.0.borrow_mut().mounted = Some(mounted);
                Err(error)
            }
        }
    }
}

/// Non-owning counterpart of [`ComponentHandle`].
#[derive(Debug, Clone)]
pub struct WeakComponentHandle(Weak<RefCell<Instance>>);

impl WeakComponentHandle {
    /// Upgrades to a strong handle while the instance is alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<ComponentHandle> {
        self.0.upgrade().map(ComponentHandle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{node::Element, node::Text};
    use serde_json::json;

    struct Greeting;

    impl Component for Greeting {
        fn render(&self, scope: &Scope<'_>) -> Result<Node> {
            let name = scope
                .prop("name")
                .and_then(Value::as_str)
                .unwrap_or("nobody");
            let mut element = Element::new("p");
            element.append_child(Text::new(format!("hello {name}")));
            for child in scope.children() {
                element.append_child(child.clone());
            }
            Ok(element.into())
        }

        fn initial_state(&self) -> Option<Value> {
            Some(json!({"seen": 0}))
        }
    }

    #[test]
    fn render_reads_props_and_children() {
        let handle = ComponentHandle::new(Greeting);
        handle.set_attribute("name", "ada");
        handle.append_child(Text::new("!"));
        let tree = handle.to_virtual_node().unwrap();
        assert_eq!(tree.tag(), "p");
        assert_eq!(tree.children().len(), 2);
        assert!(tree.children()[0].is_same_node(&crate::vnode::VText::new("hello ada").into()));
    }

    #[test]
    fn rendering_twice_gives_equal_trees() {
        let handle = ComponentHandle::new(Greeting);
        handle.set_attribute("name", "ada");
        assert_eq!(
            handle.to_virtual_node().unwrap(),
            handle.to_virtual_node().unwrap()
        );
    }

    #[test]
    fn set_state_before_mount_merges_and_reports() {
        let handle = ComponentHandle::new(Greeting);
        let error = handle.set_state(json!({"extra": true})).unwrap_err();
        assert!(matches!(error, Error::NotMounted(name) if name.ends_with("Greeting")));
        assert_eq!(handle.state(), json!({"seen": 0, "extra": true}));
        assert!(!handle.is_mounted());
        assert!(handle.cursor().is_none());
    }

    #[test]
    fn weak_handles_upgrade_while_alive() {
        let handle = ComponentHandle::new(Greeting);
        let weak = handle.downgrade();
        assert!(weak.upgrade().is_some_and(|strong| strong.ptr_eq(&handle)));
        drop(handle);
        assert!(weak.upgrade().is_none());
    }
}
