//! Authorship tags on document nodes.
//!
//! The tag is a `data-author` attribute holding a space-joined set of
//! author ids. It is the only durable attribution state: it lives on
//! the node, survives document save/load via the attribute map, and is
//! written exclusively by the local-edit tagging step. Reads must
//! tolerate anything: a missing, empty, or malformed value is just an
//! empty author set.

use crate::AuthorId;
use marginalia_dom::{NodeId, RenderedDocument};
use std::collections::BTreeSet;

/// Attribute the authorship tag is stored under.
pub const AUTHOR_ATTR: &str = "data-author";

/// Read the author set of a node. Never fails: missing or malformed
/// tags yield the empty set, empty tokens are ignored.
pub fn authors_of_node(doc: &RenderedDocument, id: NodeId) -> BTreeSet<AuthorId> {
    match doc.attribute(id, AUTHOR_ATTR) {
        Some(value) => parse_authors(value),
        None => BTreeSet::new(),
    }
}

/// Add an author to a node's tag. Text nodes cannot hold attributes,
/// so the tag goes on the parent element instead. Idempotent.
pub fn add_author_to_node(doc: &mut RenderedDocument, id: NodeId, author: &str) {
    let target = if doc.is_element(id) {
        Some(id)
    } else {
        doc.parent(id)
    };

    let Some(target) = target else {
        return;
    };

    let mut authors = authors_of_node(doc, target);
    authors.insert(author.to_string());

    let joined = authors.into_iter().collect::<Vec<_>>().join(" ");
    doc.set_attribute(target, AUTHOR_ATTR, joined);
}

/// Clear a node's tag. Element nodes only; no-op otherwise. Used when
/// an edit replaces a node's content outright and the prior authors no
/// longer apply.
pub fn reset_authors_of_node(doc: &mut RenderedDocument, id: NodeId) {
    if doc.is_element(id) {
        doc.set_attribute(id, AUTHOR_ATTR, "");
    }
}

fn parse_authors(value: &str) -> BTreeSet<AuthorId> {
    value
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
