//! Cursors: replaceable spans of the output tree.
//!
//! Every rendered virtual node occupies exactly one output node, so a span is either that
//! node or an empty insertion point between two siblings. A [`Cursor`] is a shared handle
//! to such a span. A component and the root of its virtual tree hold the same handle, and
//! a virtual node that survives a diff inherits its predecessor's handle, so re-anchoring
//! the span through [`Cursor::replace_with`] is seen by every holder at once.

use core::fmt;
use std::{cell::RefCell, rc::Rc};

use crate::backend::{BackendError, NodeId, Surface};

/// The region of output a cursor currently denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    /// The span is exactly this output node.
    Occupied(NodeId),
    /// An empty position inside `parent`, right after `after` (or first when `None`).
    Collapsed {
        /// Container the position lives in.
        parent: NodeId,
        /// Preceding sibling, if any.
        after: Option<NodeId>,
    },
}

/// Shared handle to a [`Span`].
#[derive(Clone)]
pub struct Cursor(Rc<RefCell<Span>>);

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.span()).finish()
    }
}

impl Cursor {
    fn from_span(span: Span) -> Self {
        Self(Rc::new(RefCell::new(span)))
    }

    /// Creates an empty cursor inside `parent`, right after `after`.
    #[must_use]
    pub fn collapsed(parent: NodeId, after: Option<NodeId>) -> Self {
        Self::from_span(Span::Collapsed { parent, after })
    }

    /// Creates an empty cursor after the current last child of `container`.
    ///
    /// # Errors
    ///
    /// Fails when the backend does not know `container`.
    pub fn at_end(surface: &Surface, container: NodeId) -> Result<Self, BackendError> {
        let after = surface.last_child(container)?;
        Ok(Self::collapsed(container, after))
    }

    /// Deletes everything inside `container` and returns a cursor spanning the now empty
    /// region.
    ///
    /// # Errors
    ///
    /// Fails when the backend does not know `container`.
    pub fn clear(surface: &Surface, container: NodeId) -> Result<Self, BackendError> {
        surface.clear(container)?;
        Ok(Self::collapsed(container, None))
    }

    /// Returns a copy of the current span.
    #[must_use]
    pub fn span(&self) -> Span {
        *self.0.borrow()
    }

    /// Returns the output node occupying the span, if it is not empty.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        match self.span() {
            Span::Occupied(node) => Some(node),
            Span::Collapsed { .. } => None,
        }
    }

    /// Removes whatever occupies the span, puts `node` there and re-anchors the span to it.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure; the span is left untouched in that case.
    pub fn replace_with(&self, surface: &Surface, node: NodeId) -> Result<(), BackendError> {
        match self.span() {
            Span::Occupied(old) => surface.replace(old, node)?,
            Span::Collapsed { parent, after } => surface.insert_after(parent, after, node)?,
        }
        *self.0.borrow_mut() = Span::Occupied(node);
        Ok(())
    }

    /// Derives a new, empty cursor right after this one.
    ///
    /// # Errors
    ///
    /// Fails when the occupied node has been detached from its parent.
    pub fn derive_following(&self, surface: &Surface) -> Result<Self, BackendError> {
        match self.span() {
            Span::Occupied(node) => {
                let parent = surface.parent(node)?.ok_or(BackendError::Detached(node))?;
                Ok(Self::collapsed(parent, Some(node)))
            }
            span @ Span::Collapsed { .. } => Ok(Self::from_span(span)),
        }
    }

    /// Returns `true` when both handles share the same span.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
