//! # Marginalia DOM
//!
//! Rendered-document tree model for authorship attribution.
//!
//! This crate is the engine's view of the host editor's rendered
//! content: an arena-allocated tree of elements and text nodes, where
//! each element carries its attributes and its vertical extent in the
//! content container. The host owns layout and structure; this model
//! only has to be faithful enough to resolve edit-operation paths and
//! to read/write attributes on the nodes those paths name.

pub mod path;
pub mod tree;

pub use path::{node_at_path, NodePath, PathError};
pub use tree::{Node, NodeId, Region, RenderedDocument};
