//! Published marker data for the render projection.
//!
//! The engine never touches presentation internals; it emits a
//! declarative per-author marker list and lets the external render
//! projection diff it into the view.

use crate::profiles::ProfileCache;
use marginalia_attribution::{AttributionsByAuthor, AuthorId};
use marginalia_dom::Region;
use serde::{Deserialize, Serialize};

/// Marker color for authors whose profile has not resolved yet.
pub const DEFAULT_MARKER_COLOR: &str = "#777";

/// One author's markers: display style plus regions in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorMarkers {
    pub author: AuthorId,
    pub color: String,
    /// Display name; absent while the profile is unresolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub regions: Vec<Region>,
}

/// A completed reconciliation pass, as delivered to subscribers. Each
/// update fully replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerUpdate {
    /// Monotonic publish counter for this session.
    pub revision: u64,
    pub markers: Vec<AuthorMarkers>,
}

/// Join the grouped attributions with whatever profiles have resolved.
/// Authors are ordered by id so updates are deterministic.
pub fn project_markers(
    revision: u64,
    attributions: &AttributionsByAuthor,
    profiles: &ProfileCache,
) -> MarkerUpdate {
    let mut markers: Vec<AuthorMarkers> = attributions
        .iter()
        .map(|(author, regions)| {
            let profile = profiles.get(author);
            AuthorMarkers {
                author: author.clone(),
                color: profile
                    .and_then(|p| p.color.clone())
                    .unwrap_or_else(|| DEFAULT_MARKER_COLOR.to_string()),
                name: profile.map(|p| p.name.clone()),
                regions: regions.clone(),
            }
        })
        .collect();

    markers.sort_by(|a, b| a.author.cmp(&b.author));

    MarkerUpdate { revision, markers }
}
