//! Shared scaffolding for the scenario tests: a fully wired in-memory
//! environment, snapshot-wait helpers, and a store decorator that drops
//! commentCount increments to reproduce counter drift.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth_adapters::SimpleAuthProvider;
use domains::document::{Document, Query, Subscription, WriteOp};
use domains::error::{AppError, Result};
use domains::models::{AggregatedPost, AuthUser, Category, Comment, PostDraft};
use domains::ports::{AuthProvider, DocumentStore};
use services::accounts::{AccountService, SignupForm};
use services::comments::CommentFeed;
use storage_adapters::MemoryDocumentStore;
use tokio::sync::watch;

pub const WAIT: Duration = Duration::from_secs(2);

/// A wired-up environment over a fresh in-memory store.
pub struct Env {
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub accounts: AccountService,
}

impl Env {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryDocumentStore::new()))
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        let auth: Arc<dyn AuthProvider> = Arc::new(SimpleAuthProvider::new());
        let accounts = AccountService::new(store.clone(), auth.clone());
        Env {
            store,
            auth,
            accounts,
        }
    }

    /// Signs up and signs in a user with the given nickname.
    pub async fn login(&self, email: &str, nickname: &str) -> AuthUser {
        self.accounts
            .sign_up(&SignupForm {
                email: email.to_string(),
                password: "secret1".to_string(),
                confirm_password: "secret1".to_string(),
                nickname: nickname.to_string(),
                profile_image: None,
            })
            .await
            .expect("signup");
        self.accounts
            .sign_in(email, "secret1")
            .await
            .expect("signin")
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

pub fn draft(title: &str, category: Category) -> PostDraft {
    PostDraft {
        title: title.to_string(),
        content: format!("{title} body"),
        category,
        image_urls: vec![],
    }
}

/// Blocks until the published feed satisfies `pred`, or panics after `WAIT`.
pub async fn wait_for_feed<F>(
    rx: &mut watch::Receiver<Vec<AggregatedPost>>,
    pred: F,
) -> Vec<AggregatedPost>
where
    F: Fn(&[AggregatedPost]) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            {
                let published = rx.borrow_and_update();
                if pred(&published) {
                    return published.clone();
                }
            }
            rx.changed().await.expect("aggregation pipeline closed");
        }
    })
    .await
    .expect("feed condition not reached in time")
}

/// Blocks until the live comment thread satisfies `pred`.
pub async fn wait_for_comments<F>(feed: &mut CommentFeed, pred: F) -> Vec<Comment>
where
    F: Fn(&[Comment]) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let comments = feed.next().await.expect("comment stream closed");
            if pred(&comments) {
                return comments;
            }
        }
    })
    .await
    .expect("comment condition not reached in time")
}

/// Decorator that fails every commentCount increment on the posts
/// collection, leaving all other traffic untouched. Reproduces the
/// non-transactional create-then-increment drift.
pub struct CounterFailingStore {
    inner: Arc<dyn DocumentStore>,
}

impl CounterFailingStore {
    pub fn wrap(inner: Arc<dyn DocumentStore>) -> Self {
        CounterFailingStore { inner }
    }
}

#[async_trait]
impl DocumentStore for CounterFailingStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn list(&self, query: &Query) -> Result<Vec<Document>> {
        self.inner.list(query).await
    }

    async fn add(&self, collection: &str, ops: Vec<WriteOp>) -> Result<String> {
        self.inner.add(collection, ops).await
    }

    async fn set(&self, collection: &str, id: &str, ops: Vec<WriteOp>) -> Result<()> {
        self.inner.set(collection, id, ops).await
    }

    async fn update(&self, collection: &str, id: &str, ops: Vec<WriteOp>) -> Result<()> {
        let touches_counter = ops
            .iter()
            .any(|op| matches!(op, WriteOp::Increment(f, _) if f == "commentCount"));
        if collection == "posts" && touches_counter {
            return Err(AppError::Internal("counter write dropped".to_string()));
        }
        self.inner.update(collection, id, ops).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.inner.delete(collection, id).await
    }

    async fn subscribe(&self, query: &Query) -> Result<Subscription> {
        self.inner.subscribe(query).await
    }
}
