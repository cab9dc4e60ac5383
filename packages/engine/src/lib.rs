//! # Marginalia Engine
//!
//! Async orchestration for authorship markers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host events: init / local edit / remote     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ engine: tag local edits, coalesce signals,  │
//! │  run serialized reconciliation passes       │
//! │  - walk + group (marginalia-attribution)    │
//! │  - resolve unknown author profiles          │
//! │  - publish marker updates to subscribers    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ render projection: draws per-author markers │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tags are the only durable state**: the published mapping is a
//!    derived view, rebuilt wholesale every pass
//! 2. **One pass at a time**: signals arriving mid-pass collapse into
//!    a single trailing re-run, so a later pass never loses to an
//!    earlier one
//! 3. **Profiles are best-effort**: a failed fetch falls back to the
//!    default marker style and is retried on the periodic refresh
//! 4. **Owned per session**: no globals; [`MarkerEngine::shutdown`]
//!    releases every task and subscriber
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marginalia_engine::{Changeset, EngineConfig, MarkerEngine};
//!
//! let engine = MarkerEngine::new(document, "me".into(), store, EngineConfig::default());
//! let mut updates = engine.subscribe().await;
//!
//! engine.document_initialized();
//! engine.local_update(changeset);
//!
//! while let Some(update) = updates.recv().await {
//!     // redraw markers
//! }
//! ```

pub mod markers;
pub mod ops;
pub mod profiles;
pub mod session;

mod reconciler;

pub use markers::{project_markers, AuthorMarkers, MarkerUpdate, DEFAULT_MARKER_COLOR};
pub use ops::{Changeset, EditOperation};
pub use profiles::{AuthorProfile, MemoryProfileStore, ProfileCache, ProfileFetchError, ProfileStore};
pub use session::{EngineConfig, HostEvent, MarkerEngine};

// Re-export the types host adapters exchange with the engine.
pub use marginalia_attribution::{AttributionsByAuthor, AuthorId};
pub use marginalia_dom::{NodePath, Region, RenderedDocument};
