//! # Comment Thread
//!
//! Live comment list for one post (createdAt ascending) plus add/edit/delete
//! with compensating updates to the parent post's denormalized commentCount.
//! The comment write and the counter increment are two separate,
//! non-transactional store calls: a failed increment leaves the counter
//! drifted until the aggregator recounts, and is logged rather than surfaced.

use std::sync::Arc;

use domains::document::{collections, Direction, Query, Subscription, WriteOp};
use domains::error::{AppError, Result};
use domains::models::{AuthUser, Comment};
use domains::ports::DocumentStore;
use tracing::warn;

use crate::lookup::nickname_or_anonymous;

pub struct CommentThread {
    store: Arc<dyn DocumentStore>,
    post_id: String,
}

impl CommentThread {
    pub fn new(store: Arc<dyn DocumentStore>, post_id: impl Into<String>) -> Self {
        CommentThread {
            store,
            post_id: post_id.into(),
        }
    }

    /// Opens the live comment stream for this post.
    pub async fn subscribe(&self) -> Result<CommentFeed> {
        let query = Query::collection(collections::COMMENTS)
            .where_eq("postId", self.post_id.as_str())
            .order_by("createdAt", Direction::Asc);
        Ok(CommentFeed {
            inner: self.store.subscribe(&query).await?,
        })
    }

    /// Creates a comment authored by `user` and bumps the parent counter.
    ///
    /// The author nickname is snapshotted at creation time; later nickname
    /// changes do not rewrite history.
    pub async fn add(&self, text: &str, user: Option<&AuthUser>) -> Result<String> {
        let content = text.trim();
        if content.is_empty() {
            return Err(AppError::ValidationError(
                "comment text must not be empty".to_string(),
            ));
        }
        let user = user.ok_or_else(|| {
            AppError::ValidationError("sign in to write a comment".to_string())
        })?;

        let author_name = nickname_or_anonymous(self.store.as_ref(), &user.id).await;

        let id = self
            .store
            .add(
                collections::COMMENTS,
                vec![
                    WriteOp::set("postId", self.post_id.as_str()),
                    WriteOp::set("authorId", user.id.as_str()),
                    WriteOp::set("authorName", author_name),
                    WriteOp::set("content", content),
                    WriteOp::server_timestamp("createdAt"),
                ],
            )
            .await?;

        self.bump_counter(1).await;
        Ok(id)
    }

    /// Overwrites the comment content in place. `createdAt` and `authorName`
    /// are untouched.
    pub async fn edit(&self, comment_id: &str, text: &str) -> Result<()> {
        let content = text.trim();
        if content.is_empty() {
            return Err(AppError::ValidationError(
                "comment text must not be empty".to_string(),
            ));
        }
        self.store
            .update(
                collections::COMMENTS,
                comment_id,
                vec![WriteOp::set("content", content)],
            )
            .await
    }

    /// Removes the comment and decrements the parent counter.
    pub async fn delete(&self, comment_id: &str) -> Result<()> {
        self.store.delete(collections::COMMENTS, comment_id).await?;
        self.bump_counter(-1).await;
        Ok(())
    }

    /// Best-effort counter compensation. Not retried; drift is recovered by
    /// the aggregator's live recount.
    async fn bump_counter(&self, delta: i64) {
        let op = vec![WriteOp::increment("commentCount", delta)];
        if let Err(err) = self
            .store
            .update(collections::POSTS, &self.post_id, op)
            .await
        {
            warn!(
                post_id = %self.post_id,
                delta,
                %err,
                "commentCount compensation failed, counter drifts until recounted"
            );
        }
    }
}

/// Whether the acting user may edit or delete this comment. A UX gate only;
/// the store is assumed to enforce ownership server-side.
pub fn can_modify(comment: &Comment, user: Option<&AuthUser>) -> bool {
    user.is_some_and(|u| u.id == comment.author_id)
}

/// The live comment stream: each delivery is the full current thread,
/// ascending by createdAt.
pub struct CommentFeed {
    inner: Subscription,
}

impl CommentFeed {
    pub async fn next(&mut self) -> Option<Vec<Comment>> {
        let snapshot = self.inner.next().await?;
        let comments = snapshot
            .docs
            .iter()
            .filter_map(|doc| match Comment::from_document(doc) {
                Ok(comment) => Some(comment),
                Err(err) => {
                    warn!(id = %doc.id, %err, "skipping malformed comment document");
                    None
                }
            })
            .collect();
        Some(comments)
    }
}

/// Immutable view state for the detail screen's comment section.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThreadState {
    /// Whether the comment composer is open.
    pub composing: bool,
    /// Comment currently being edited inline, if any.
    pub editing: Option<String>,
    /// Comment whose owner menu (edit/delete) is open, if any.
    pub menu_open: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadAction {
    ToggleComposer,
    CommentSubmitted,
    OpenMenu(String),
    CloseMenu,
    BeginEdit(String),
    FinishEdit,
}

/// Pure transition function for the comment section.
pub fn reduce(state: ThreadState, action: ThreadAction) -> ThreadState {
    match action {
        ThreadAction::ToggleComposer => ThreadState {
            composing: !state.composing,
            ..state
        },
        ThreadAction::CommentSubmitted => ThreadState {
            composing: false,
            ..state
        },
        ThreadAction::OpenMenu(id) => ThreadState {
            menu_open: Some(id),
            ..state
        },
        ThreadAction::CloseMenu => ThreadState {
            menu_open: None,
            ..state
        },
        ThreadAction::BeginEdit(id) => ThreadState {
            editing: Some(id),
            ..state
        },
        ThreadAction::FinishEdit => ThreadState {
            editing: None,
            menu_open: None,
            ..state
        },
    }
}
