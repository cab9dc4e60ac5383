//! Arena-backed rendered document tree.
//!
//! Nodes are addressed by [`NodeId`] (index into the arena), so the
//! tree can be shared behind a lock and nodes referenced across await
//! points without borrowing into it. Elements hold an attribute map
//! (the persistence surface that the authorship tag rides on) and a
//! [`Region`] describing where the host laid them out.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a node in its document's arena.
pub type NodeId = usize;

/// Vertical extent of a rendered element, in px, relative to the top
/// of the content container (scroll-independent).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub y: f64,
    pub height: f64,
}

impl Region {
    pub fn new(y: f64, height: f64) -> Self {
        Self { y, height }
    }
}

/// A single node in the rendered tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Element {
        tag: String,
        attributes: HashMap<String, String>,
        region: Region,
        children: Vec<NodeId>,
    },

    Text {
        content: String,
    },
}

impl Node {
    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element { .. })
    }
}

/// Arena entry: the node plus its parent link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    node: Node,
    parent: Option<NodeId>,
}

/// The rendered document: a root element and its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    entries: Vec<Entry>,
    root: NodeId,
}

impl RenderedDocument {
    /// Create a document with a single root element.
    pub fn new(root_tag: impl Into<String>) -> Self {
        let root = Node::Element {
            tag: root_tag.into(),
            attributes: HashMap::new(),
            region: Region::default(),
            children: Vec::new(),
        };
        Self {
            entries: vec![Entry {
                node: root,
                parent: None,
            }],
            root: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append a new element under `parent` and return its id.
    /// Panics if `parent` is not an element.
    pub fn append_element(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        self.push(
            Node::Element {
                tag: tag.into(),
                attributes: HashMap::new(),
                region: Region::default(),
                children: Vec::new(),
            },
            parent,
        )
    }

    /// Append a new text node under `parent` and return its id.
    /// Panics if `parent` is not an element.
    pub fn append_text(&mut self, parent: NodeId, content: impl Into<String>) -> NodeId {
        self.push(
            Node::Text {
                content: content.into(),
            },
            parent,
        )
    }

    fn push(&mut self, node: Node, parent: NodeId) -> NodeId {
        assert!(
            self.is_element(parent),
            "parent of a new node must be an element"
        );
        let id = self.entries.len();
        self.entries.push(Entry {
            node,
            parent: Some(parent),
        });
        if let Node::Element { children, .. } = &mut self.entries[parent].node {
            children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.entries.get(id).map(|e| &e.node)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries.get(id).and_then(|e| e.parent)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).map(Node::is_element).unwrap_or(false)
    }

    /// Child ids in document order; empty for text nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Some(Node::Element { children, .. }) => children,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.node(id) {
            Some(Node::Element { attributes, .. }) => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Set an attribute on an element; text nodes are left untouched.
    pub fn set_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(Entry {
            node: Node::Element { attributes, .. },
            ..
        }) = self.entries.get_mut(id)
        {
            attributes.insert(name.into(), value.into());
        }
    }

    pub fn region(&self, id: NodeId) -> Option<Region> {
        match self.node(id) {
            Some(Node::Element { region, .. }) => Some(*region),
            _ => None,
        }
    }

    /// Record where the host laid an element out. No-op on text nodes.
    pub fn set_region(&mut self, id: NodeId, region: Region) {
        if let Some(Entry {
            node: Node::Element { region: r, .. },
            ..
        }) = self.entries.get_mut(id)
        {
            *r = region;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
