//! Tree walker: collect attribution records from the rendered tree.

use crate::tags::authors_of_node;
use crate::AuthorId;
use marginalia_dom::{NodeId, RenderedDocument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One element's attribution snapshot, built fresh on every pass and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionRecord {
    pub y: f64,
    pub height: f64,
    pub authors: BTreeSet<AuthorId>,
}

/// Depth-first pre-order collection over the descendant elements of
/// `root` (the root itself is skipped, text nodes contribute nothing).
///
/// Record order is document order, which downstream grouping relies on
/// as the canonical vertical ordering. No sort by y happens here: an
/// element the host positioned out of flow keeps its document-order
/// slot.
pub fn seek_authors(doc: &RenderedDocument, root: NodeId) -> Vec<AttributionRecord> {
    let mut records = Vec::new();
    collect(doc, root, &mut records);
    records
}

fn collect(doc: &RenderedDocument, parent: NodeId, records: &mut Vec<AttributionRecord>) {
    for &child in doc.children(parent) {
        let Some(region) = doc.region(child) else {
            continue;
        };

        records.push(AttributionRecord {
            y: region.y,
            height: region.height,
            authors: authors_of_node(doc, child),
        });

        collect(doc, child, records);
    }
}
