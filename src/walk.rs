//! Pre-order traversal over a node tree.

use crate::error::WalkError;
use crate::node::{Node, NodeKind};

/// Walk `node` in pre-order, calling `visit(parent, node)` before its children.
///
/// Documents descend into their child, sequences into every item and
/// mappings into every value; keys are never visited. An alias fails with
/// [`WalkError::UnsupportedNodeKind`] after the visitor has seen it. The
/// first error, from the visitor or from the walk itself, stops the
/// traversal and is returned as-is.
///
/// Children are snapshotted before descending, so the visitor may mutate
/// the node it is handed.
pub fn walk<E, F>(node: &Node, visit: &mut F) -> Result<(), E>
where
    F: FnMut(Option<&Node>, &Node) -> Result<(), E>,
    E: From<WalkError>,
{
    walk_inner(None, node, visit)
}

fn walk_inner<E, F>(parent: Option<&Node>, node: &Node, visit: &mut F) -> Result<(), E>
where
    F: FnMut(Option<&Node>, &Node) -> Result<(), E>,
    E: From<WalkError>,
{
    visit(parent, node)?;

    if matches!(*node.kind(), NodeKind::Alias(_)) {
        return Err(WalkError::UnsupportedNodeKind { kind: "alias" }.into());
    }

    for child in node.children() {
        walk_inner(Some(node), &child, visit)?;
    }
    Ok(())
}
