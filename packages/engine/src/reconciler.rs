//! Reconciliation passes: walk → group → resolve → publish.
//!
//! Passes are serialized by the session's signal loop; this module
//! only ever runs one at a time. The invariants it keeps:
//!
//! - the read lock on the document is held for the walk only, never
//!   across a fetch
//! - a pass publishes exactly once, after every profile fetch it
//!   started has settled
//! - nothing is published once the session has shut down

use crate::markers::{project_markers, MarkerUpdate};
use crate::profiles::{ProfileCache, ProfileStore};
use marginalia_attribution::{group_by_author, seek_authors, AttributionsByAuthor, AuthorId};
use marginalia_dom::RenderedDocument;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

pub(crate) struct Reconciler {
    pub(crate) document: Arc<RwLock<RenderedDocument>>,
    pub(crate) store: Arc<dyn ProfileStore>,
    pub(crate) profiles: RwLock<ProfileCache>,
    pub(crate) attributions: RwLock<AttributionsByAuthor>,
    subscribers: RwLock<Vec<mpsc::Sender<MarkerUpdate>>>,
    /// Cleared on shutdown; publishes are guarded on it so an
    /// in-flight pass finishes harmlessly.
    active: AtomicBool,
    revision: AtomicU64,
    channel_capacity: usize,
}

impl Reconciler {
    pub(crate) fn new(
        document: Arc<RwLock<RenderedDocument>>,
        store: Arc<dyn ProfileStore>,
        channel_capacity: usize,
    ) -> Self {
        Self {
            document,
            store,
            profiles: RwLock::new(ProfileCache::new()),
            attributions: RwLock::new(AttributionsByAuthor::new()),
            subscribers: RwLock::new(Vec::new()),
            active: AtomicBool::new(true),
            revision: AtomicU64::new(0),
            channel_capacity,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Register a render-projection subscriber.
    pub(crate) async fn subscribe(&self) -> mpsc::Receiver<MarkerUpdate> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        self.subscribers.write().await.push(tx);
        rx
    }

    /// Drop all subscriber channels (teardown).
    pub(crate) async fn close_subscribers(&self) {
        self.subscribers.write().await.clear();
    }

    async fn broadcast(&self, update: MarkerUpdate) {
        let subscribers = self.subscribers.read().await;
        for tx in subscribers.iter() {
            // Waits for a saturated subscriber rather than dropping
            // the update; a gone subscriber is skipped.
            let _ = tx.send(update.clone()).await;
        }
    }

    /// One full reconciliation pass over the current document state.
    pub(crate) async fn run_pass(&self) {
        let records = {
            let doc = self.document.read().await;
            seek_authors(&doc, doc.root())
        };
        let grouped = group_by_author(&records);

        self.resolve_authors(grouped.keys().cloned().collect()).await;

        if !self.is_active() {
            tracing::debug!("session shut down mid-pass; discarding result");
            return;
        }

        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let update = {
            let profiles = self.profiles.read().await;
            project_markers(revision, &grouped, &profiles)
        };
        *self.attributions.write().await = grouped;

        tracing::debug!(revision, authors = update.markers.len(), "publishing markers");
        self.broadcast(update).await;
    }

    /// Fetch every author in `authors` that the cache does not know
    /// yet, in parallel. Failures are logged and left unresolved; the
    /// next pass or periodic refresh retries them.
    async fn resolve_authors(&self, authors: Vec<AuthorId>) {
        let missing: Vec<AuthorId> = {
            let cache = self.profiles.read().await;
            authors
                .into_iter()
                .filter(|author| !cache.contains_key(author))
                .collect()
        };

        self.fetch_all(missing).await;
    }

    /// Re-fetch every currently known profile, keeping name and color
    /// fresh independently of document changes.
    pub(crate) async fn refresh_profiles(&self) {
        let known: Vec<AuthorId> = self.profiles.read().await.keys().cloned().collect();
        self.fetch_all(known).await;
    }

    async fn fetch_all(&self, authors: Vec<AuthorId>) {
        let handles: Vec<_> = authors
            .into_iter()
            .map(|author| {
                let store = Arc::clone(&self.store);
                let id = author.clone();
                (
                    author,
                    tokio::spawn(async move { store.fetch_profile(&id).await }),
                )
            })
            .collect();

        for (author, handle) in handles {
            match handle.await {
                Ok(Ok(profile)) => {
                    self.profiles.write().await.insert(author, profile);
                }
                Ok(Err(err)) => {
                    tracing::warn!(%author, error = %err, "profile fetch failed; using default marker");
                }
                Err(err) => {
                    tracing::warn!(%author, error = %err, "profile fetch task failed");
                }
            }
        }
    }
}
