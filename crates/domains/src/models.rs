//! # Domain Models
//!
//! These structs represent the board entities as they live in the document
//! store. Field names are camelCase on the wire to match the store schema,
//! and document ids travel outside the field map.

use crate::document::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed category set for posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    General,
    Info,
    Question,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Info => "Info",
            Category::Question => "Question",
        }
    }
}

/// Category selection for the feed view. `All` passes every post through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(Category),
}

/// Supported feed orderings. `Newest` relies on the store's createdAt
/// descending base query and is therefore a no-op at view time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Newest,
    MostViewed,
}

/// A board post as stored in the `posts` collection.
///
/// `views` and `comment_count` are denormalized counters maintained by
/// independent atomic increments; `comment_count` tracks the true comment
/// count eventually, not transactionally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub author_id: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub comment_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A comment in the `comments` collection.
///
/// `author_name` is a snapshot of the commenter's nickname at creation time
/// and is intentionally never updated when the user renames themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(skip)]
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A user profile document in the `users` collection, keyed by the auth id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(skip)]
    pub id: String,
    pub email: String,
    pub nickname: String,
    pub profile_image: String,
    pub created_at: DateTime<Utc>,
}

/// The authenticated identity as the auth provider reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// A post joined with its author nickname and live comment count, as the
/// aggregator publishes it. `comment_count` here is the freshly counted
/// value, not the post's stored counter.
#[derive(Debug, Clone)]
pub struct AggregatedPost {
    pub post: Post,
    pub nickname: String,
    pub comment_count: u64,
}

impl AggregatedPost {
    pub fn id(&self) -> &str {
        &self.post.id
    }

    pub fn views(&self) -> u64 {
        self.post.views
    }
}

/// User-supplied post content, validated by the write flow before submission.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub image_urls: Vec<String>,
}

macro_rules! document_conversions {
    ($ty:ty) => {
        impl $ty {
            /// Parses a store document, carrying the document id over.
            pub fn from_document(doc: &Document) -> serde_json::Result<Self> {
                let mut parsed: Self =
                    serde_json::from_value(Value::Object(doc.fields.clone()))?;
                parsed.id = doc.id.clone();
                Ok(parsed)
            }

            /// Serializes into a field map suitable for a store write. The id
            /// is excluded; the store owns identifier assignment.
            pub fn to_fields(&self) -> serde_json::Result<crate::document::Fields> {
                match serde_json::to_value(self)? {
                    Value::Object(map) => Ok(map),
                    _ => unreachable!("struct serializes to an object"),
                }
            }
        }
    };
}

document_conversions!(Post);
document_conversions!(Comment);
document_conversions!(UserProfile);
