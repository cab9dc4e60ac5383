//! Author profiles and the identity-store seam.
//!
//! Profiles are owned by an external identity store; the engine keeps
//! a local cache of whichever profiles it has resolved so far and
//! refreshes them periodically. A missing cache entry is never an
//! error; rendering falls back to the default marker style until the
//! profile resolves.

use async_trait::async_trait;
use marginalia_attribution::AuthorId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// A resolved author identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub id: AuthorId,
    pub name: String,
    /// Preferred marker color, if the author has picked one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileFetchError {
    #[error("profile request for {id} failed with status {status}")]
    Status { id: AuthorId, status: u16 },

    #[error("profile transport error: {0}")]
    Transport(String),

    #[error("no profile for author {0}")]
    Unknown(AuthorId),
}

/// Locally resolved profiles, keyed by author id.
pub type ProfileCache = HashMap<AuthorId, AuthorProfile>;

/// The external identity store, as the engine sees it.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_profile(&self, id: &str) -> Result<AuthorProfile, ProfileFetchError>;

    /// Persist a profile change (e.g. the local user picking a new
    /// marker color).
    async fn update_profile(&self, profile: AuthorProfile) -> Result<(), ProfileFetchError>;
}

/// In-memory store for tests and demos.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<ProfileCache>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: AuthorProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn fetch_profile(&self, id: &str) -> Result<AuthorProfile, ProfileFetchError> {
        self.profiles
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ProfileFetchError::Unknown(id.to_string()))
    }

    async fn update_profile(&self, profile: AuthorProfile) -> Result<(), ProfileFetchError> {
        self.insert(profile).await;
        Ok(())
    }
}
