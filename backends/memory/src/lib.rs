//! In-memory output document for rill.
//!
//! [`MemoryDocument`] implements [`rill_core::Backend`] over an arena of element and text
//! nodes. It is the reference backend: tests inspect it through [`MemoryDocument::snapshot`]
//! and markup, and the terminal presenter reads from it.

pub use crate::document::{MemoryDocument, ROOT_TAG};
pub use crate::snapshot::Snapshot;

mod document;
mod snapshot;
