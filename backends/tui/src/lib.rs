//! Terminal presenter for rill.
//!
//! [`TuiApp`] mounts trees into an in-memory document and draws that document as an
//! indented outline, either to `stdout` or into a buffer for tests.

pub use crate::app::{TuiApp, TuiAppBuilder};
pub use crate::renderer::{RenderFrame, RenderLine, RenderSegment, Renderer};
pub use crate::terminal::Terminal;

mod app;
mod error;
mod renderer;
mod terminal;

pub use error::TuiError;
