//! Per-document marker session.
//!
//! [`MarkerEngine`] owns all attribution state for one editing
//! session: the signal loop that serializes reconciliation passes, the
//! periodic profile refresh, and the write side that stamps local
//! edits with the local user's id. Host adapters translate their
//! editor's lifecycle events into the three entry points below; the
//! engine never sees the host's event types.

use crate::markers::MarkerUpdate;
use crate::ops::Changeset;
use crate::profiles::{AuthorProfile, ProfileFetchError, ProfileStore};
use crate::reconciler::Reconciler;
use marginalia_attribution::{
    add_author_to_node, reset_authors_of_node, AttributionsByAuthor, AuthorId,
};
use marginalia_dom::{node_at_path, RenderedDocument};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Notify, RwLock};

/// The closed set of host signals a session reacts to. Adapters map
/// their editor's own event names onto these; there is no dynamic
/// event-name dispatch anywhere in the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The document finished loading.
    DocumentInitialized,
    /// The local user edited; carries the edit's full changeset.
    LocalUpdate(Changeset),
    /// Another participant edited; content arrives already tagged.
    RemoteEdit,
}

/// Tunables for a marker session.
pub struct EngineConfig {
    /// How often known profiles are re-fetched so name/color changes
    /// propagate without waiting for an edit.
    pub refresh_interval: Duration,

    /// Capacity of each subscriber's update channel.
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(10),
            channel_capacity: 100,
        }
    }
}

/// One document's authorship-marker session.
pub struct MarkerEngine {
    reconciler: Arc<Reconciler>,
    local_user: AuthorId,
    signal: Arc<Notify>,
    shutdown: watch::Sender<bool>,
}

impl MarkerEngine {
    /// Create a session over a live document and start its background
    /// tasks. Must be called within a tokio runtime.
    pub fn new(
        document: Arc<RwLock<RenderedDocument>>,
        local_user: AuthorId,
        store: Arc<dyn ProfileStore>,
        config: EngineConfig,
    ) -> Self {
        let reconciler = Arc::new(Reconciler::new(document, store, config.channel_capacity));
        let signal = Arc::new(Notify::new());
        let (shutdown, shutdown_rx) = watch::channel(false);

        Self::spawn_signal_loop(
            Arc::clone(&reconciler),
            Arc::clone(&signal),
            shutdown_rx.clone(),
        );
        Self::spawn_refresh_timer(
            Arc::clone(&reconciler),
            Arc::clone(&signal),
            shutdown_rx,
            config.refresh_interval,
        );

        Self {
            reconciler,
            local_user,
            signal,
            shutdown,
        }
    }

    /// The signal loop: at most one pass in flight. `Notify` stores a
    /// single permit, so any number of signals arriving during a pass
    /// collapse into exactly one trailing re-run, so a later pass can
    /// never lose to an earlier one.
    fn spawn_signal_loop(
        reconciler: Arc<Reconciler>,
        signal: Arc<Notify>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = signal.notified() => reconciler.run_pass().await,
                    _ = shutdown.changed() => break,
                }
            }
            reconciler.close_subscribers().await;
        });
    }

    fn spawn_refresh_timer(
        reconciler: Arc<Reconciler>,
        signal: Arc<Notify>,
        mut shutdown: watch::Receiver<bool>,
        refresh_interval: Duration,
    ) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(refresh_interval);
            // The immediate first tick would just refresh an empty cache.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        reconciler.refresh_profiles().await;
                        // Republish so refreshed names/colors reach subscribers.
                        signal.notify_one();
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    /// Dispatch a host signal to the matching entry point.
    pub fn handle_event(&self, event: HostEvent) {
        match event {
            HostEvent::DocumentInitialized => self.document_initialized(),
            HostEvent::LocalUpdate(changeset) => self.local_update(changeset),
            HostEvent::RemoteEdit => self.remote_edit(),
        }
    }

    /// Host event: the document finished loading. Bootstraps the
    /// initial marker view.
    pub fn document_initialized(&self) {
        self.signal.notify_one();
    }

    /// Host event: another participant edited the document. Incoming
    /// content carries its own tags, so no local tagging happens.
    pub fn remote_edit(&self) {
        self.signal.notify_one();
    }

    /// Host event: the local user edited the document.
    ///
    /// Tagging is deferred one scheduling turn so the tree reflects
    /// the edit's structural changes before paths are resolved, then
    /// the whole changeset is tagged as a batch and exactly one change
    /// signal fires.
    pub fn local_update(&self, changeset: Changeset) {
        let document = Arc::clone(&self.reconciler.document);
        let signal = Arc::clone(&self.signal);
        let local_user = self.local_user.clone();

        tokio::spawn(async move {
            tokio::task::yield_now().await;

            {
                let mut doc = document.write().await;
                for op in &changeset.ops {
                    let Some(path) = op.target() else {
                        continue;
                    };
                    let node = match node_at_path(&doc, path) {
                        Ok(node) => node,
                        Err(err) => {
                            tracing::debug!(error = %err, "skipping op with unresolvable path");
                            continue;
                        }
                    };
                    if op.is_destructive_replace() {
                        // Replaced content has no meaningful prior authors.
                        reset_authors_of_node(&mut doc, node);
                    }
                    add_author_to_node(&mut doc, node, &local_user);
                }
            }

            signal.notify_one();
        });
    }

    /// Register a render-projection subscriber. Every completed pass
    /// delivers one [`MarkerUpdate`]; the channel closes on shutdown.
    pub async fn subscribe(&self) -> mpsc::Receiver<MarkerUpdate> {
        self.reconciler.subscribe().await
    }

    /// The latest published mapping (empty before the first pass).
    pub async fn attributions(&self) -> AttributionsByAuthor {
        self.reconciler.attributions.read().await.clone()
    }

    /// A cached profile, if it has resolved.
    pub async fn profile(&self, author: &str) -> Option<AuthorProfile> {
        self.reconciler.profiles.read().await.get(author).cloned()
    }

    pub fn local_user(&self) -> &str {
        &self.local_user
    }

    /// Persist a new marker color for the local user and update the
    /// cache, so the next publish carries it.
    pub async fn set_local_color(
        &self,
        color: impl Into<String>,
    ) -> Result<(), ProfileFetchError> {
        let color = color.into();

        let cached = self
            .reconciler
            .profiles
            .read()
            .await
            .get(&self.local_user)
            .cloned();
        let mut profile = match cached {
            Some(profile) => profile,
            None => self.reconciler.store.fetch_profile(&self.local_user).await?,
        };

        profile.color = Some(color);
        self.reconciler.store.update_profile(profile.clone()).await?;
        self.reconciler
            .profiles
            .write()
            .await
            .insert(self.local_user.clone(), profile);

        self.signal.notify_one();
        Ok(())
    }

    /// Tear the session down: stop both background tasks, close
    /// subscriber channels, and let any in-flight pass finish without
    /// publishing. Idempotent.
    pub fn shutdown(&self) {
        self.reconciler.deactivate();
        let _ = self.shutdown.send(true);
    }
}

impl Drop for MarkerEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
