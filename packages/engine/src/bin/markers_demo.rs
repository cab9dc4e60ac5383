//! Simulated marker session: builds a small document, plays local and
//! remote edits through the engine, and prints each published update.

use marginalia_engine::{
    AuthorProfile, Changeset, EditOperation, EngineConfig, MarkerEngine, MemoryProfileStore,
    Region, RenderedDocument,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let store = Arc::new(MemoryProfileStore::new());
    store
        .insert(AuthorProfile {
            id: "ada".to_string(),
            name: "Ada".to_string(),
            color: Some("#3366ff".to_string()),
        })
        .await;
    store
        .insert(AuthorProfile {
            id: "brendan".to_string(),
            name: "Brendan".to_string(),
            color: Some("#cc3333".to_string()),
        })
        .await;

    // A short article Brendan wrote earlier.
    let document = Arc::new(RwLock::new({
        let mut doc = RenderedDocument::new("article");
        let h1 = doc.append_element(doc.root(), "h1");
        doc.set_region(h1, Region::new(0.0, 32.0));
        doc.set_attribute(h1, "data-author", "brendan");

        let p = doc.append_element(doc.root(), "p");
        doc.set_region(p, Region::new(40.0, 60.0));
        doc.set_attribute(p, "data-author", "brendan");

        let p2 = doc.append_element(doc.root(), "p");
        doc.set_region(p2, Region::new(108.0, 44.0));
        doc
    }));

    let engine = MarkerEngine::new(
        Arc::clone(&document),
        "ada".to_string(),
        store,
        EngineConfig::default(),
    );
    let mut updates = engine.subscribe().await;

    println!("Starting marker session for user 'ada'");

    engine.document_initialized();

    // Ada edits the second paragraph.
    engine.local_update(Changeset::new(vec![EditOperation::at(vec![2])]));

    // Brendan replaces the heading wholesale on another client; the
    // synced content arrives already re-tagged.
    {
        let mut doc = document.write().await;
        doc.set_attribute(1, "data-author", "brendan");
    }
    engine.remote_edit();

    // Drain the updates those three events produce.
    for _ in 0..3 {
        match tokio::time::timeout(Duration::from_secs(1), updates.recv()).await {
            Ok(Some(update)) => {
                println!("--- revision {} ---", update.revision);
                for marker in &update.markers {
                    let name = marker.name.as_deref().unwrap_or("<unresolved>");
                    println!("  {} ({}, {})", marker.author, name, marker.color);
                    for region in &marker.regions {
                        println!("    y={:>6.1}px  height={:>6.1}px", region.y, region.height);
                    }
                }
            }
            _ => break,
        }
    }

    engine.shutdown();
    println!("Session closed");

    Ok(())
}
