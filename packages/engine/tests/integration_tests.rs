//! Integration tests for the marker engine: full sessions over a live
//! document, exercising signal coalescing, batching, fallback styling,
//! and teardown.

use async_trait::async_trait;
use marginalia_engine::{
    AuthorProfile, Changeset, EditOperation, EngineConfig, HostEvent, MarkerEngine, MarkerUpdate,
    MemoryProfileStore, ProfileFetchError, ProfileStore, Region, RenderedDocument,
    DEFAULT_MARKER_COLOR,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock, Semaphore};
use tokio::time::timeout;

fn profile(id: &str, name: &str, color: &str) -> AuthorProfile {
    AuthorProfile {
        id: id.to_string(),
        name: name.to_string(),
        color: Some(color.to_string()),
    }
}

/// Document from the canonical example: u1-only, co-owned, untagged.
fn sample_document() -> Arc<RwLock<RenderedDocument>> {
    let mut doc = RenderedDocument::new("article");

    let first = doc.append_element(doc.root(), "p");
    doc.set_region(first, Region::new(0.0, 10.0));
    doc.set_attribute(first, "data-author", "u1");

    let second = doc.append_element(doc.root(), "p");
    doc.set_region(second, Region::new(10.0, 20.0));
    doc.set_attribute(second, "data-author", "u1 u2");

    let third = doc.append_element(doc.root(), "p");
    doc.set_region(third, Region::new(30.0, 5.0));

    Arc::new(RwLock::new(doc))
}

async fn recv_update(rx: &mut mpsc::Receiver<MarkerUpdate>) -> MarkerUpdate {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for marker update")
        .expect("update channel closed unexpectedly")
}

async fn assert_no_update(rx: &mut mpsc::Receiver<MarkerUpdate>) {
    let extra = timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(extra.is_err(), "unexpected extra update: {:?}", extra);
}

#[tokio::test]
async fn test_initial_pass_publishes_grouped_markers() {
    let store = Arc::new(MemoryProfileStore::new());
    store.insert(profile("u1", "Ada", "#ff0000")).await;
    store.insert(profile("u2", "Brendan", "#00ff00")).await;

    let engine = MarkerEngine::new(
        sample_document(),
        "u1".to_string(),
        store,
        EngineConfig::default(),
    );
    let mut updates = engine.subscribe().await;

    engine.handle_event(HostEvent::DocumentInitialized);
    let update = recv_update(&mut updates).await;

    assert_eq!(update.revision, 1);
    assert_eq!(update.markers.len(), 2, "untagged element must not appear");

    let u1 = &update.markers[0];
    assert_eq!(u1.author, "u1");
    assert_eq!(u1.color, "#ff0000");
    assert_eq!(u1.name.as_deref(), Some("Ada"));
    assert_eq!(
        u1.regions,
        vec![Region::new(0.0, 10.0), Region::new(10.0, 20.0)]
    );

    let u2 = &update.markers[1];
    assert_eq!(u2.regions, vec![Region::new(10.0, 20.0)]);

    let attributions = engine.attributions().await;
    assert_eq!(attributions["u1"].len(), 2);
    assert_eq!(attributions["u2"].len(), 1);

    engine.shutdown();
}

/// Store whose fetches block until the test hands out permits.
struct GatedStore {
    gate: Semaphore,
    inner: MemoryProfileStore,
}

#[async_trait]
impl ProfileStore for GatedStore {
    async fn fetch_profile(&self, id: &str) -> Result<AuthorProfile, ProfileFetchError> {
        self.gate.acquire().await.unwrap().forget();
        self.inner.fetch_profile(id).await
    }

    async fn update_profile(&self, profile: AuthorProfile) -> Result<(), ProfileFetchError> {
        self.inner.update_profile(profile).await
    }
}

#[tokio::test]
async fn test_signals_during_pass_collapse_into_one_trailing_pass() {
    let store = Arc::new(GatedStore {
        gate: Semaphore::new(0),
        inner: MemoryProfileStore::new(),
    });
    store.inner.insert(profile("u1", "Ada", "#ff0000")).await;
    store.inner.insert(profile("u2", "Brendan", "#00ff00")).await;

    let document = Arc::new(RwLock::new({
        let mut doc = RenderedDocument::new("article");
        let p = doc.append_element(0, "p");
        doc.set_region(p, Region::new(0.0, 10.0));
        doc.set_attribute(p, "data-author", "u1");
        doc
    }));

    let engine = MarkerEngine::new(
        Arc::clone(&document),
        "u1".to_string(),
        store.clone(),
        EngineConfig::default(),
    );
    let mut updates = engine.subscribe().await;

    // First pass starts and parks inside the u1 fetch.
    engine.document_initialized();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Document changes and several signals arrive while it is parked.
    {
        let mut doc = document.write().await;
        let p2 = doc.append_element(0, "p");
        doc.set_region(p2, Region::new(10.0, 20.0));
        doc.set_attribute(p2, "data-author", "u2");
    }
    engine.remote_edit();
    engine.remote_edit();
    engine.remote_edit();

    store.gate.add_permits(10);

    let first = recv_update(&mut updates).await;
    assert_eq!(first.revision, 1);

    // Exactly one trailing pass, reflecting the post-signal document.
    let second = recv_update(&mut updates).await;
    assert_eq!(second.revision, 2);
    assert!(second.markers.iter().any(|m| m.author == "u2"));

    assert_no_update(&mut updates).await;

    engine.shutdown();
}

#[tokio::test]
async fn test_local_update_tags_whole_changeset_then_signals_once() {
    let store = Arc::new(MemoryProfileStore::new());
    store.insert(profile("me", "Me", "#123456")).await;

    let document = Arc::new(RwLock::new({
        let mut doc = RenderedDocument::new("article");
        for i in 0..3 {
            let p = doc.append_element(0, "p");
            doc.set_region(p, Region::new(i as f64 * 10.0, 10.0));
        }
        doc
    }));

    let engine = MarkerEngine::new(
        Arc::clone(&document),
        "me".to_string(),
        store,
        EngineConfig::default(),
    );
    let mut updates = engine.subscribe().await;

    engine.local_update(Changeset::new(vec![
        EditOperation::at(vec![0]),
        EditOperation::at(vec![1]),
        EditOperation::at(vec![2]),
    ]));

    let update = recv_update(&mut updates).await;
    assert_eq!(update.markers.len(), 1);
    assert_eq!(update.markers[0].author, "me");
    assert_eq!(update.markers[0].regions.len(), 3);

    // One edit, one signal, one publish.
    assert_no_update(&mut updates).await;

    let doc = document.read().await;
    for i in 1..=3 {
        assert_eq!(doc.attribute(i, "data-author"), Some("me"));
    }
    drop(doc);

    engine.shutdown();
}

#[tokio::test]
async fn test_destructive_replace_drops_prior_authors() {
    let store = Arc::new(MemoryProfileStore::new());
    store.insert(profile("me", "Me", "#123456")).await;

    let document = Arc::new(RwLock::new({
        let mut doc = RenderedDocument::new("article");
        let p = doc.append_element(0, "p");
        doc.set_region(p, Region::new(0.0, 10.0));
        doc.set_attribute(p, "data-author", "ghost older");
        doc
    }));

    let engine = MarkerEngine::new(
        Arc::clone(&document),
        "me".to_string(),
        store,
        EngineConfig::default(),
    );
    let mut updates = engine.subscribe().await;

    // `to` with no `from`: reset first, then tag the local user.
    engine.local_update(Changeset::new(vec![EditOperation::replaced(vec![0])]));

    let update = recv_update(&mut updates).await;
    assert_eq!(update.markers.len(), 1);
    assert_eq!(update.markers[0].author, "me");

    let doc = document.read().await;
    assert_eq!(doc.attribute(1, "data-author"), Some("me"));
    drop(doc);

    engine.shutdown();
}

#[tokio::test]
async fn test_unresolvable_op_paths_are_skipped() {
    let store = Arc::new(MemoryProfileStore::new());

    let engine = MarkerEngine::new(
        sample_document(),
        "me".to_string(),
        store,
        EngineConfig::default(),
    );
    let mut updates = engine.subscribe().await;

    engine.local_update(Changeset::new(vec![
        EditOperation::at(vec![9, 9]),
        EditOperation::default(),
    ]));

    // The pass still runs; the ops just contribute no attribution.
    let update = recv_update(&mut updates).await;
    assert!(update.markers.iter().all(|m| m.author != "me"));

    engine.shutdown();
}

#[tokio::test]
async fn test_shutdown_silences_further_events() {
    let store = Arc::new(MemoryProfileStore::new());
    store.insert(profile("u1", "Ada", "#ff0000")).await;
    store.insert(profile("u2", "Brendan", "#00ff00")).await;

    let engine = MarkerEngine::new(
        sample_document(),
        "u1".to_string(),
        store,
        EngineConfig::default(),
    );
    let mut updates = engine.subscribe().await;

    engine.document_initialized();
    recv_update(&mut updates).await;

    engine.shutdown();
    engine.remote_edit();

    // No further publishes; the channel closes once teardown lands.
    match timeout(Duration::from_secs(1), updates.recv()).await {
        Ok(None) => {}
        other => panic!("expected closed channel after shutdown, got {:?}", other),
    }

    // Shutdown is idempotent.
    engine.shutdown();
}

#[tokio::test]
async fn test_slow_subscriber_receives_every_update() {
    let store = Arc::new(MemoryProfileStore::new());
    store.insert(profile("u1", "Ada", "#ff0000")).await;
    store.insert(profile("u2", "Brendan", "#00ff00")).await;

    let engine = MarkerEngine::new(
        sample_document(),
        "u1".to_string(),
        store,
        EngineConfig {
            channel_capacity: 1,
            ..EngineConfig::default()
        },
    );
    let mut updates = engine.subscribe().await;

    // Two passes complete before the subscriber reads anything; the
    // second publish waits for channel space instead of dropping.
    engine.document_initialized();
    tokio::time::sleep(Duration::from_millis(50)).await;
    engine.remote_edit();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let first = recv_update(&mut updates).await;
    let second = recv_update(&mut updates).await;
    assert_eq!(first.revision, 1);
    assert_eq!(second.revision, 2);

    engine.shutdown();
}

/// Store that fails its first few fetches, then recovers.
struct FlakyStore {
    failures: AtomicUsize,
    inner: MemoryProfileStore,
}

#[async_trait]
impl ProfileStore for FlakyStore {
    async fn fetch_profile(&self, id: &str) -> Result<AuthorProfile, ProfileFetchError> {
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(ProfileFetchError::Status {
                id: id.to_string(),
                status: 503,
            });
        }
        self.inner.fetch_profile(id).await
    }

    async fn update_profile(&self, profile: AuthorProfile) -> Result<(), ProfileFetchError> {
        self.inner.update_profile(profile).await
    }
}

#[tokio::test]
async fn test_fetch_failure_uses_default_marker_until_refresh_retries() {
    let store = Arc::new(FlakyStore {
        failures: AtomicUsize::new(1),
        inner: MemoryProfileStore::new(),
    });
    store.inner.insert(profile("u1", "Ada", "#ff0000")).await;

    // Single tagged author, so the injected failure hits its fetch.
    let document = Arc::new(RwLock::new({
        let mut doc = RenderedDocument::new("article");
        let p = doc.append_element(0, "p");
        doc.set_region(p, Region::new(0.0, 10.0));
        doc.set_attribute(p, "data-author", "u1");
        doc
    }));

    let engine = MarkerEngine::new(
        document,
        "u1".to_string(),
        store,
        EngineConfig {
            refresh_interval: Duration::from_millis(50),
            ..EngineConfig::default()
        },
    );
    let mut updates = engine.subscribe().await;

    engine.document_initialized();

    let first = recv_update(&mut updates).await;
    let u1 = first.markers.iter().find(|m| m.author == "u1").unwrap();
    assert_eq!(u1.color, DEFAULT_MARKER_COLOR);
    assert!(u1.name.is_none());

    // The refresh timer keeps triggering passes; the retried fetch
    // eventually succeeds and the real color comes through.
    let resolved = loop {
        let update = recv_update(&mut updates).await;
        let u1 = update.markers.iter().find(|m| m.author == "u1").unwrap();
        if u1.color != DEFAULT_MARKER_COLOR {
            break u1.clone();
        }
    };
    assert_eq!(resolved.color, "#ff0000");
    assert_eq!(resolved.name.as_deref(), Some("Ada"));

    engine.shutdown();
}

#[tokio::test]
async fn test_set_local_color_persists_and_republishes() {
    let store = Arc::new(MemoryProfileStore::new());
    store.insert(profile("u1", "Ada", "#ff0000")).await;
    store.insert(profile("u2", "Brendan", "#00ff00")).await;

    let engine = MarkerEngine::new(
        sample_document(),
        "u1".to_string(),
        store.clone(),
        EngineConfig::default(),
    );
    let mut updates = engine.subscribe().await;

    engine.document_initialized();
    let first = recv_update(&mut updates).await;
    assert_eq!(first.markers[0].color, "#ff0000");

    engine.set_local_color("#abcdef").await.unwrap();

    let update = recv_update(&mut updates).await;
    let u1 = update.markers.iter().find(|m| m.author == "u1").unwrap();
    assert_eq!(u1.color, "#abcdef");

    // The change went through the store, not just the cache.
    let persisted = store.fetch_profile("u1").await.unwrap();
    assert_eq!(persisted.color.as_deref(), Some("#abcdef"));

    engine.shutdown();
}
