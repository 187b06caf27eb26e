//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the services. The
//! document store, auth provider, and device storage are external
//! collaborators; the core only ever sees these contracts.

use crate::document::{Document, Query, Subscription, WriteOp};
use crate::error::Result;
use crate::models::AuthUser;
use async_trait::async_trait;

/// Generic CRUD + query + live-subscription contract over document
/// collections.
///
/// `subscribe` registers a live query: the store delivers an initial full
/// snapshot immediately and a fresh full snapshot after every change touching
/// the watched collection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point lookup. `Ok(None)` for a missing document, never an error.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// One-shot query evaluation (filtered, ordered).
    async fn list(&self, query: &Query) -> Result<Vec<Document>>;

    /// Creates a document; the store assigns the id and resolves any
    /// `ServerTimestamp` ops.
    async fn add(&self, collection: &str, ops: Vec<WriteOp>) -> Result<String>;

    /// Upsert with a caller-chosen id (used for profiles keyed by auth id).
    async fn set(&self, collection: &str, id: &str, ops: Vec<WriteOp>) -> Result<()>;

    /// Partial update; fails with `NotFound` on a stale reference.
    /// `Increment` ops are atomic per field.
    async fn update(&self, collection: &str, id: &str, ops: Vec<WriteOp>) -> Result<()>;

    /// Fails with `NotFound` on a stale reference.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    async fn subscribe(&self, query: &Query) -> Result<Subscription>;
}

/// Identity contract. The backing provider owns credential storage and
/// session state; the core only asks who is signed in.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Fails with `AuthError` on malformed input or a duplicate email.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Fails with `AuthError` on bad credentials.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    fn current_user(&self) -> Option<AuthUser>;

    fn sign_out(&self);
}

/// Device-local key-value storage (the recently-viewed list lives here).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
}
