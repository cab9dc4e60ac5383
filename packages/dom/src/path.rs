//! Structural paths into the rendered tree.
//!
//! Host edit operations identify their targets by child-index paths
//! from the document root, matching the post-edit tree shape. Paths
//! index into the full child list (elements and text nodes alike).

use crate::tree::{NodeId, RenderedDocument};
use thiserror::Error;

/// Child-index path from the root. Empty path = the root itself.
pub type NodePath = Vec<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("path step {index} out of range at depth {depth}")]
    OutOfRange { index: usize, depth: usize },

    #[error("path descends into a text node at depth {depth}")]
    IntoText { depth: usize },
}

/// Resolve a child-index path against the current tree.
pub fn node_at_path(doc: &RenderedDocument, path: &[usize]) -> Result<NodeId, PathError> {
    let mut current = doc.root();

    for (depth, &index) in path.iter().enumerate() {
        if !doc.is_element(current) {
            return Err(PathError::IntoText { depth });
        }
        let children = doc.children(current);
        current = *children
            .get(index)
            .ok_or(PathError::OutOfRange { index, depth })?;
    }

    Ok(current)
}
