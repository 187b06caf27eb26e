//! # Recently-Viewed Tracker
//!
//! Persists an ordered list of post ids in device-local storage and resolves
//! them back to full posts on demand. Ids are de-duplicated on reinsert
//! (a repeat view moves the post to the tail) and the list is capped at the
//! most recent N entries.

use std::sync::Arc;

use domains::document::collections;
use domains::error::Result;
use domains::models::Post;
use domains::ports::{DocumentStore, KeyValueStorage};
use tracing::warn;

/// Storage key holding the JSON-encoded id array.
pub const STORAGE_KEY: &str = "viewedPosts";

pub const DEFAULT_CAP: usize = 50;

pub struct RecentlyViewed {
    storage: Arc<dyn KeyValueStorage>,
    store: Arc<dyn DocumentStore>,
    cap: usize,
}

impl RecentlyViewed {
    pub fn new(storage: Arc<dyn KeyValueStorage>, store: Arc<dyn DocumentStore>) -> Self {
        Self::with_cap(storage, store, DEFAULT_CAP)
    }

    pub fn with_cap(
        storage: Arc<dyn KeyValueStorage>,
        store: Arc<dyn DocumentStore>,
        cap: usize,
    ) -> Self {
        RecentlyViewed { storage, store, cap }
    }

    /// Appends `post_id` to the persisted sequence.
    pub async fn record_view(&self, post_id: &str) -> Result<()> {
        let mut ids = self.load().await;
        ids.retain(|id| id != post_id);
        ids.push(post_id.to_string());
        if ids.len() > self.cap {
            let excess = ids.len() - self.cap;
            ids.drain(..excess);
        }
        let encoded = serde_json::to_string(&ids)?;
        self.storage.set_item(STORAGE_KEY, &encoded).await
    }

    /// Resolves the persisted ids to full posts, in stored order. Ids whose
    /// post has since been deleted are silently skipped.
    pub async fn list_viewed(&self) -> Result<Vec<Post>> {
        let ids = self.load().await;
        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.get(collections::POSTS, &id).await? {
                Some(doc) => match Post::from_document(&doc) {
                    Ok(post) => posts.push(post),
                    Err(err) => {
                        warn!(%id, %err, "skipping malformed post in viewed list");
                    }
                },
                None => {}
            }
        }
        Ok(posts)
    }

    /// A missing or corrupt persisted value yields an empty list, never an
    /// error.
    async fn load(&self) -> Vec<String> {
        match self.storage.get_item(STORAGE_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(%err, "corrupt viewedPosts value, starting over");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(%err, "viewedPosts read failed, starting over");
                Vec::new()
            }
        }
    }
}
