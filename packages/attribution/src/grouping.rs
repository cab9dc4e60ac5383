//! Group attribution records into per-author region lists.

use crate::walker::AttributionRecord;
use crate::AuthorId;
use marginalia_dom::Region;
use std::collections::HashMap;

/// Author → regions in document traversal order. Published wholesale
/// after every reconciliation pass; never patched incrementally.
pub type AttributionsByAuthor = HashMap<AuthorId, Vec<Region>>;

/// For each record, every author in its set gets a full-height region.
/// Co-owning authors each receive the whole region (markers stack; no
/// width subdivision). Records with no authors have nothing to key
/// against and are dropped.
pub fn group_by_author(records: &[AttributionRecord]) -> AttributionsByAuthor {
    let mut by_author = AttributionsByAuthor::new();

    for record in records {
        for author in &record.authors {
            by_author
                .entry(author.clone())
                .or_default()
                .push(Region::new(record.y, record.height));
        }
    }

    by_author
}
