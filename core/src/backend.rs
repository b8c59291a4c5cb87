//! Output backend capability set consumed by the core.
//!
//! The core never creates or mutates output nodes itself. Everything that touches the
//! rendered tree goes through the [`Backend`] trait, which concrete surfaces (an in-memory
//! document, a DOM bridge, ...) implement. Backends are shared through a [`Surface`] handle
//! so that a mounted component can keep reconciling after the mount call returned.

use core::fmt;
use std::{cell::RefCell, rc::Rc};

use thiserror::Error;

/// Identifier for an output node issued by a [`Backend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a new [`NodeId`] from the raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index backing this identifier.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// An event delivered to listeners bound on an output element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: String,
    target: NodeId,
}

impl Event {
    /// Creates an event with the given (already normalised) name.
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    /// Returns the event name, e.g. `click`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the output node the event was dispatched on.
    #[must_use]
    pub const fn target(&self) -> NodeId {
        self.target
    }
}

/// A reference-counted event callback.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    /// Wraps a closure into a listener.
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Invokes the callback.
    pub fn call(&self, event: &Event) {
        (self.0)(event);
    }

    /// Returns `true` when both listeners wrap the same callback allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Listener")
    }
}

/// Failures reported by an output backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The node was never issued by this backend.
    #[error("output node {0:?} does not exist")]
    UnknownNode(NodeId),
    /// The operation needs a parent, but the node is not attached anywhere.
    #[error("output node {0:?} is not attached to a parent")]
    Detached(NodeId),
    /// The operation needs an element, but the node is a text leaf.
    #[error("output node {0:?} is not an element")]
    NotAnElement(NodeId),
    /// The anchor node is not a child of the given parent.
    #[error("output node {node:?} is not a child of {parent:?}")]
    NotAChild {
        /// The anchor that was expected to be a child.
        node: NodeId,
        /// The parent that was searched.
        parent: NodeId,
    },
    /// Inserting the node would make it its own ancestor.
    #[error("inserting {node:?} into {parent:?} would create a cycle")]
    Cycle {
        /// The node being inserted.
        node: NodeId,
        /// The would-be parent.
        parent: NodeId,
    },
}

/// Capability set an output surface has to provide.
///
/// Nodes created through [`Backend::create_element`] and [`Backend::create_text`] start
/// detached; they only become part of the visible tree through [`Backend::insert_after`]
/// or [`Backend::replace`].
pub trait Backend: fmt::Debug {
    /// Creates a detached element node for `tag`.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Creates a detached text node.
    fn create_text(&mut self, content: &str) -> NodeId;

    /// Sets (or overwrites) an attribute on an element.
    ///
    /// # Errors
    ///
    /// Fails when `node` is unknown or is not an element.
    fn set_attribute(&mut self, node: NodeId, key: &str, value: &str) -> Result<(), BackendError>;

    /// Removes a previously set attribute. Removing a missing attribute is not an error.
    ///
    /// # Errors
    ///
    /// Fails when `node` is unknown or is not an element.
    fn remove_attribute(&mut self, node: NodeId, key: &str) -> Result<(), BackendError>;

    /// Binds a listener for `event` on an element.
    ///
    /// # Errors
    ///
    /// Fails when `node` is unknown or is not an element.
    fn add_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: Listener,
    ) -> Result<(), BackendError>;

    /// Returns the listeners bound for `event` on `node`, in binding order.
    ///
    /// # Errors
    ///
    /// Fails when `node` is unknown.
    fn listeners(&self, node: NodeId, event: &str) -> Result<Vec<Listener>, BackendError>;

    /// Returns the parent of `node`, if it is attached.
    ///
    /// # Errors
    ///
    /// Fails when `node` is unknown.
    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, BackendError>;

    /// Returns the last child of `node`, if any.
    ///
    /// # Errors
    ///
    /// Fails when `node` is unknown.
    fn last_child(&self, node: NodeId) -> Result<Option<NodeId>, BackendError>;

    /// Inserts `node` into `parent` right after `after`, or as the first child when `after`
    /// is `None`. The node is detached from its previous parent first.
    ///
    /// # Errors
    ///
    /// Fails on unknown nodes, a non-element parent, an anchor that is not a child of
    /// `parent`, or an insertion that would create a cycle.
    fn insert_after(
        &mut self,
        parent: NodeId,
        after: Option<NodeId>,
        node: NodeId,
    ) -> Result<(), BackendError>;

    /// Puts `new` at the position currently held by `old`; `old` becomes detached.
    ///
    /// # Errors
    ///
    /// Fails on unknown nodes, a detached `old`, or a replacement that would create a cycle.
    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), BackendError>;

    /// Detaches every child of `container`.
    ///
    /// # Errors
    ///
    /// Fails when `container` is unknown.
    fn clear(&mut self, container: NodeId) -> Result<(), BackendError>;
}

/// Shared handle to a backend.
///
/// Every call borrows the backend only for its own duration, which lets listeners that
/// run during [`Surface::dispatch`] trigger a new reconciliation pass on the same backend.
#[derive(Clone)]
pub struct Surface(Rc<RefCell<dyn Backend>>);

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Surface").field(&self.0).finish()
    }
}

impl Surface {
    /// Wraps a shared backend.
    #[must_use]
    pub fn new<B: Backend + 'static>(backend: Rc<RefCell<B>>) -> Self {
        Self(backend)
    }

    /// See [`Backend::create_element`].
    #[must_use]
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.0.borrow_mut().create_element(tag)
    }

    /// See [`Backend::create_text`].
    #[must_use]
    pub fn create_text(&self, content: &str) -> NodeId {
        self.0.borrow_mut().create_text(content)
    }

    /// See [`Backend::set_attribute`].
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn set_attribute(&self, node: NodeId, key: &str, value: &str) -> Result<(), BackendError> {
        self.0.borrow_mut().set_attribute(node, key, value)
    }

    /// See [`Backend::remove_attribute`].
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn remove_attribute(&self, node: NodeId, key: &str) -> Result<(), BackendError> {
        self.0.borrow_mut().remove_attribute(node, key)
    }

    /// See [`Backend::add_listener`].
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn add_listener(
        &self,
        node: NodeId,
        event: &str,
        listener: Listener,
    ) -> Result<(), BackendError> {
        self.0.borrow_mut().add_listener(node, event, listener)
    }

    /// See [`Backend::parent`].
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn parent(&self, node: NodeId) -> Result<Option<NodeId>, BackendError> {
        self.0.borrow().parent(node)
    }

    /// See [`Backend::last_child`].
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn last_child(&self, node: NodeId) -> Result<Option<NodeId>, BackendError> {
        self.0.borrow().last_child(node)
    }

    /// See [`Backend::insert_after`].
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn insert_after(
        &self,
        parent: NodeId,
        after: Option<NodeId>,
        node: NodeId,
    ) -> Result<(), BackendError> {
        self.0.borrow_mut().insert_after(parent, after, node)
    }

    /// See [`Backend::replace`].
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn replace(&self, old: NodeId, new: NodeId) -> Result<(), BackendError> {
        self.0.borrow_mut().replace(old, new)
    }

    /// See [`Backend::clear`].
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn clear(&self, container: NodeId) -> Result<(), BackendError> {
        self.0.borrow_mut().clear(container)
    }

    /// Fires `event` on `target`, returning how many listeners ran.
    ///
    /// Listeners are collected first and invoked with the backend released, so they are
    /// free to call back into the surface (typically through `set_state`).
    ///
    /// # Errors
    ///
    /// Fails when `target` is unknown.
    pub fn dispatch(&self, target: NodeId, event: &str) -> Result<usize, BackendError> {
        let listeners = self.0.borrow().listeners(target, event)?;
        let event = Event::new(event, target);
        for listener in &listeners {
            listener.call(&event);
        }
        Ok(listeners.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn listener_identity() {
        let listener = Listener::new(|_| {});
        let same = listener.clone();
        let other = Listener::new(|_| {});
        assert!(listener.ptr_eq(&same));
        assert!(!listener.ptr_eq(&other));
    }

    #[test]
    fn listener_receives_event() {
        let seen = Rc::new(Cell::new(None));
        let sink = seen.clone();
        let listener = Listener::new(move |event| sink.set(Some(event.target())));
        listener.call(&Event::new("click", NodeId::new(7)));
        assert_eq!(seen.get(), Some(NodeId::new(7)));
    }

    #[test]
    fn backend_error_display() {
        let error = BackendError::NotAChild {
            node: NodeId::new(1),
            parent: NodeId::new(2),
        };
        assert_eq!(
            error.to_string(),
            "output node NodeId(1) is not a child of NodeId(2)"
        );
    }
}
