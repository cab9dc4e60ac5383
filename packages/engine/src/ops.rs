//! Edit operations from the host edit stream.
//!
//! The engine does not interpret operation semantics; the host's
//! collaboration layer already applied them to the tree. All it needs
//! from an op is the structural position it touched (`path`, or `to`
//! for move/replace ops) and whether it replaced a node's content
//! outright, in which case prior authorship no longer applies.

use marginalia_dom::NodePath;
use serde::{Deserialize, Serialize};

/// One operation out of a host edit's changeset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditOperation {
    /// Structural position of the affected node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<NodePath>,

    /// Source position for move/replace ops.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NodePath>,

    /// Destination position for move/replace ops.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NodePath>,
}

impl EditOperation {
    /// Plain edit at a position.
    pub fn at(path: NodePath) -> Self {
        Self {
            path: Some(path),
            ..Self::default()
        }
    }

    /// Move from one position to another.
    pub fn moved(from: NodePath, to: NodePath) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    /// Content replaced wholesale at `to` (no `from`): the prior
    /// authorship of the target is meaningless afterwards.
    pub fn replaced(to: NodePath) -> Self {
        Self {
            to: Some(to),
            ..Self::default()
        }
    }

    /// The position attribution should be written to, if any. A move
    /// or replace lands at its destination, so `to` wins when an op
    /// carries both.
    pub fn target(&self) -> Option<&NodePath> {
        self.to.as_ref().or(self.path.as_ref())
    }

    pub fn is_destructive_replace(&self) -> bool {
        self.to.is_some() && self.from.is_none()
    }
}

/// The full set of operations one host edit produced. Attribution for
/// a changeset is written as a batch: every op is tagged before the
/// single change signal for the edit fires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    pub ops: Vec<EditOperation>,
}

impl Changeset {
    pub fn new(ops: Vec<EditOperation>) -> Self {
        Self { ops }
    }
}
