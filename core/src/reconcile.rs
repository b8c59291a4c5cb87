//! Diff/patch engine.
//!
//! Walks a previous virtual tree and a fresh one side by side, depth first and pre-order.
//! A node that fails the same-node test is re-rendered into its predecessor's cursor; a
//! node that passes inherits the cursor and has its children compared by position.
//! Children only present in the new tree are appended after the last old child.
//!
//! Two limits are deliberate: trailing old children that the new tree no longer has are
//! left in the output, and there is no keyed matching, so a reordered list re-renders
//! every shifted position.

use tracing::{debug, trace};

use crate::{
    Error, Result,
    backend::Surface,
    cursor::Cursor,
    vnode::VNode,
};

/// Counters describing what a reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Nodes patched in place (their output was kept).
    pub kept: usize,
    /// Subtrees re-rendered into an existing cursor.
    pub replaced: usize,
    /// New children written after the previous tail.
    pub appended: usize,
    /// Old children left in place because the new tree is shorter.
    pub left_behind: usize,
}

impl ReconcileStats {
    /// Returns `true` when the pass touched no output at all.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.replaced == 0 && self.appended == 0
    }
}

/// Brings the output occupied by `old` in line with `new`.
///
/// `old` must have been written out before; `new` ends up holding cursors for every node
/// it contains and becomes the tree to diff against next time.
///
/// # Errors
///
/// Returns [`Error::Unrendered`] when `old` (or one of the children it is compared
/// against) never received a cursor, and propagates backend failures. Output written
/// before a failure stays in place.
pub fn reconcile(old: &VNode, new: &mut VNode, surface: &Surface) -> Result<ReconcileStats> {
    let mut stats = ReconcileStats::default();
    update_node(old, new, surface, &mut stats)?;
    trace!(?stats, "reconcile pass finished");
    Ok(stats)
}

fn cursor_of(node: &VNode) -> Result<Cursor> {
    node.cursor()
        .cloned()
        .ok_or_else(|| Error::Unrendered(node.tag().to_owned()))
}

fn update_node(
    old: &VNode,
    new: &mut VNode,
    surface: &Surface,
    stats: &mut ReconcileStats,
) -> Result<()> {
    let cursor = cursor_of(old)?;

    if !old.is_same_node(new) {
        trace!(old = old.tag(), new = new.tag(), "replacing subtree");
        new.write_to(&cursor, surface)?;
        stats.replaced += 1;
        return Ok(());
    }

    new.set_cursor(cursor.clone());
    stats.kept += 1;

    let (VNode::Element(old), VNode::Element(new)) = (old, new) else {
        return Ok(());
    };

    let old_children = old.children();
    let new_children = new.children_mut();
    if old_children.len() > new_children.len() {
        let left = old_children.len() - new_children.len();
        stats.left_behind += left;
        debug!(
            tag = old.tag(),
            left, "new tree has fewer children; trailing output left in place"
        );
    }
    if new_children.is_empty() {
        return Ok(());
    }

    let mut tail = old_children.last().map(cursor_of).transpose()?;

    for (index, child) in new_children.iter_mut().enumerate() {
        if let Some(old_child) = old_children.get(index) {
            update_node(old_child, child, surface, stats)?;
            continue;
        }

        let slot = match &tail {
            Some(tail) => tail.derive_following(surface)?,
            None => {
                let element = cursor
                    .node()
                    .ok_or_else(|| Error::Unrendered(old.tag().to_owned()))?;
                Cursor::at_end(surface, element)?
            }
        };
        trace!(index, tag = child.tag(), "appending child");
        child.write_to(&slot, surface)?;
        stats.appended += 1;
        tail = Some(slot);
    }

    Ok(())
}
