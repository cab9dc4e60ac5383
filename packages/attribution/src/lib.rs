//! # Marginalia Attribution
//!
//! The pure core of authorship attribution: who touched which part of
//! the rendered document, and where those parts sit on screen.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ tags: data-author attribute ↔ author set    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ walker: tree → per-element records          │
//! │  (y, height, authors) in document order     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ grouping: records → author → regions        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Everything here is synchronous and side-effect free apart from the
//! tag writers; the async orchestration lives in `marginalia-engine`.

pub mod grouping;
pub mod tags;
pub mod walker;

pub use grouping::{group_by_author, AttributionsByAuthor};
pub use tags::{add_author_to_node, authors_of_node, reset_authors_of_node, AUTHOR_ATTR};
pub use walker::{seek_authors, AttributionRecord};

/// Opaque author identifier, unique per user.
pub type AuthorId = String;
