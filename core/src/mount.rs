//! Entry point that puts a composition tree into a target container.

use tracing::debug;

use crate::{
    Result,
    backend::{NodeId, Surface},
    component::ComponentHandle,
    cursor::Cursor,
    node::Node,
};

/// Empties `target` and renders `root` into it.
///
/// When `root` is a component it takes ownership of the resulting region and can be
/// updated through [`ComponentHandle::set_state`]. Anything `target` held before is
/// removed.
///
/// The returned handle is a strong reference to that component. Listeners usually reach
/// their component through a [`WeakComponentHandle`](crate::WeakComponentHandle), so the
/// component only stays live while the caller keeps `root` or the returned handle around.
///
/// # Errors
///
/// Propagates render failures and backend failures such as an unknown `target`.
pub fn mount(root: &Node, surface: &Surface, target: NodeId) -> Result<Option<ComponentHandle>> {
    let cursor = Cursor::clear(surface, target)?;
    root.write_to(&cursor, surface)?;
    debug!(?target, output = ?cursor.node(), "mounted tree");
    Ok(match root {
        Node::Component(handle) => Some(handle.clone()),
        Node::Element(_) | Node::Text(_) => None,
    })
}
