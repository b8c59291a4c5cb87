//! Core of Rill, a small declarative UI layer.
//!
//! User code builds a composition tree out of primitive elements, text and stateful
//! components ([`build`], [`Node`]). Rendering resolves it into a virtual tree
//! ([`VNode`]) whose nodes are written into an output tree owned by a [`Backend`],
//! each one recording the [`Cursor`] it occupies. When a component's state changes the
//! fresh virtual tree is [`reconcile`]d against the previous one and only the differing
//! subtrees are rewritten.
//!
//! The crate never touches a concrete output tree; see `rill-memory` for an in-memory
//! document and `rill-tui` for a terminal presenter.

#![deny(missing_debug_implementations)]

pub mod backend;
pub mod builder;
pub mod component;
pub mod cursor;
mod error;
pub mod mount;
pub mod node;
pub mod props;
pub mod reconcile;
pub mod state;
pub mod vnode;

pub use backend::{Backend, BackendError, Event, Listener, NodeId, Surface};
pub use builder::{Child, Factory, Registry, Type, build};
pub use component::{Component, ComponentHandle, Scope, WeakComponentHandle};
pub use cursor::{Cursor, Span};
pub use error::{Error, Result};
pub use mount::mount;
pub use node::{Element, Node, Text};
pub use props::{Attrs, PropValue, Props};
pub use reconcile::{ReconcileStats, reconcile};
pub use state::merge_state;
pub use vnode::{VElement, VNode, VText};

pub use serde_json::{Value, json};
