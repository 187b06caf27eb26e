//! # Post Write Flow
//!
//! Create/edit/delete for posts plus the detail-open counter bump and the
//! author's own-posts listing. Validation happens here, before anything
//! reaches the store.

use std::sync::Arc;

use domains::document::{collections, Direction, Query, WriteOp};
use domains::error::{AppError, Result};
use domains::models::{AuthUser, Post, PostDraft};
use domains::ports::DocumentStore;
use tracing::warn;

use crate::recent::RecentlyViewed;

/// Upper bound on images per post.
pub const MAX_IMAGES: usize = 10;

pub struct PostService {
    store: Arc<dyn DocumentStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        PostService { store }
    }

    /// Creates a post authored by `user`. Counters start at zero; timestamps
    /// are store-assigned.
    pub async fn create(&self, draft: &PostDraft, user: &AuthUser) -> Result<String> {
        validate(draft)?;
        self.store
            .add(
                collections::POSTS,
                vec![
                    WriteOp::set("title", draft.title.as_str()),
                    WriteOp::set("content", draft.content.as_str()),
                    WriteOp::set("category", draft.category.as_str()),
                    WriteOp::set("authorId", user.id.as_str()),
                    WriteOp::set("imageUrls", serde_json::json!(draft.image_urls)),
                    WriteOp::set("views", 0),
                    WriteOp::set("commentCount", 0),
                    WriteOp::server_timestamp("createdAt"),
                    WriteOp::server_timestamp("updatedAt"),
                ],
            )
            .await
    }

    /// Rewrites title/content/category/images and refreshes `updatedAt`.
    /// Owner-only; the ownership check mirrors the one the store enforces
    /// server-side.
    pub async fn edit(&self, post_id: &str, draft: &PostDraft, user: &AuthUser) -> Result<()> {
        validate(draft)?;
        self.ensure_owner(post_id, user).await?;
        self.store
            .update(
                collections::POSTS,
                post_id,
                vec![
                    WriteOp::set("title", draft.title.as_str()),
                    WriteOp::set("content", draft.content.as_str()),
                    WriteOp::set("category", draft.category.as_str()),
                    WriteOp::set("imageUrls", serde_json::json!(draft.image_urls)),
                    WriteOp::server_timestamp("updatedAt"),
                ],
            )
            .await
    }

    /// Deletes the post and cascade-deletes its comments. A comment that
    /// fails to delete is logged and left behind; the post itself is already
    /// gone at that point.
    pub async fn delete(&self, post_id: &str, user: &AuthUser) -> Result<()> {
        self.ensure_owner(post_id, user).await?;
        self.store.delete(collections::POSTS, post_id).await?;

        let query = Query::collection(collections::COMMENTS).where_eq("postId", post_id);
        for doc in self.store.list(&query).await? {
            if let Err(err) = self.store.delete(collections::COMMENTS, &doc.id).await {
                warn!(comment_id = %doc.id, %err, "orphaned comment survived cascade delete");
            }
        }
        Ok(())
    }

    /// Called once per detail-screen open: bumps the view counter by exactly
    /// one (repeat views count again) and records the post as recently
    /// viewed.
    pub async fn record_detail_open(
        &self,
        post_id: &str,
        recent: &RecentlyViewed,
    ) -> Result<()> {
        self.store
            .update(
                collections::POSTS,
                post_id,
                vec![WriteOp::increment("views", 1)],
            )
            .await?;
        recent.record_view(post_id).await
    }

    /// The author's own posts, newest first.
    pub async fn list_by_author(&self, author_id: &str) -> Result<Vec<Post>> {
        let query = Query::collection(collections::POSTS)
            .where_eq("authorId", author_id)
            .order_by("createdAt", Direction::Desc);
        let docs = self.store.list(&query).await?;
        Ok(docs
            .iter()
            .filter_map(|doc| match Post::from_document(doc) {
                Ok(post) => Some(post),
                Err(err) => {
                    warn!(id = %doc.id, %err, "skipping malformed post document");
                    None
                }
            })
            .collect())
    }

    async fn ensure_owner(&self, post_id: &str, user: &AuthUser) -> Result<Post> {
        let doc = self
            .store
            .get(collections::POSTS, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("post".to_string(), post_id.to_string()))?;
        let post = Post::from_document(&doc)?;
        if post.author_id != user.id {
            return Err(AppError::AuthError(
                "only the author can modify this post".to_string(),
            ));
        }
        Ok(post)
    }
}

fn validate(draft: &PostDraft) -> Result<()> {
    if draft.title.trim().is_empty() {
        return Err(AppError::ValidationError(
            "title must not be empty".to_string(),
        ));
    }
    if draft.content.trim().is_empty() {
        return Err(AppError::ValidationError(
            "content must not be empty".to_string(),
        ));
    }
    if draft.image_urls.len() > MAX_IMAGES {
        return Err(AppError::ValidationError(format!(
            "a post can carry at most {MAX_IMAGES} images"
        )));
    }
    Ok(())
}
