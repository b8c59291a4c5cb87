use std::io;

use rill_core::{BackendError, NodeId};
use thiserror::Error;

/// Errors that can occur while building or running a [`TuiApp`](crate::TuiApp).
#[derive(Debug, Error)]
pub enum TuiError {
    /// Low level terminal I/O failure.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
    /// Building, rendering or reconciling the tree failed.
    #[error(transparent)]
    Core(#[from] rill_core::Error),
    /// The output document rejected an operation.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The node asked to be presented is not part of the document.
    #[error("cannot present {0:?}: not part of the document")]
    UnknownNode(NodeId),
}
