#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

pub mod logging;

#[doc(inline)]
pub use rill_core::*;
pub use rill_memory as memory;
pub use rill_tui as tui;

pub mod prelude {
    //! Commonly used types for building and mounting trees.
    //!
    //! ```rust
    //! use rill::prelude::*;
    //!
    //! let (document, surface) = MemoryDocument::shared();
    //! let root = document.borrow().root();
    //! mount(&build("p", (), "hi")?, &surface, root)?;
    //! # Ok::<(), rill::Error>(())
    //! ```
    pub use rill_core::{
        Attrs, Child, Component, ComponentHandle, Error, Listener, Node, NodeId, Registry,
        Result, Scope, Surface, Type, WeakComponentHandle, build, children, json, mount,
    };
    pub use rill_memory::MemoryDocument;
    pub use rill_tui::{Terminal, TuiApp, TuiAppBuilder};
}
