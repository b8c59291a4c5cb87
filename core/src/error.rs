//! Error type shared by the builder, the component model and the diff engine.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors raised while building, rendering or reconciling a tree.
#[derive(Debug, Error)]
pub enum Error {
    /// The tree builder received a type with no matching tag or component.
    #[error("unknown construction target `{0}`")]
    UnknownType(String),
    /// A listener was bound under a key that does not name an event.
    #[error("listener bound to `{0}`; listener keys are `on` followed by an event name")]
    InvalidListenerKey(String),
    /// `set_state` was called on a component that does not own an output region.
    #[error("component `{0}` is not mounted into an output region")]
    NotMounted(&'static str),
    /// A previous tree was reconciled before it had ever been written out.
    #[error("virtual node `{0}` has not been written to an output region")]
    Unrendered(String),
    /// The output backend rejected an operation.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
