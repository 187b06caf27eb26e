//! # Post Aggregator
//!
//! Watches the `posts` collection (createdAt descending) and republishes a
//! fully denormalized view-model list on every snapshot: each post joined
//! with its author nickname and a live comment count. The published list is
//! only swapped in once every per-post lookup has settled, so consumers never
//! see a half-resolved feed.

use std::sync::Arc;

use domains::document::{collections, Direction, Document, Query};
use domains::error::Result;
use domains::models::{AggregatedPost, Post};
use domains::ports::DocumentStore;
use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::lookup::nickname_or_anonymous;

/// Live aggregation pipeline over the posts collection.
///
/// Constructed together with the `watch` receiver that carries the published
/// list; `run` drives the pipeline until the store subscription closes or the
/// last receiver is dropped.
pub struct PostAggregator {
    store: Arc<dyn DocumentStore>,
    tx: watch::Sender<Vec<AggregatedPost>>,
    last_published: u64,
}

impl PostAggregator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
    ) -> (Self, watch::Receiver<Vec<AggregatedPost>>) {
        let (tx, rx) = watch::channel(Vec::new());
        (
            PostAggregator {
                store,
                tx,
                last_published: 0,
            },
            rx,
        )
    }

    /// Consumes the aggregator and processes snapshots until shutdown.
    ///
    /// Pending snapshots are coalesced to the latest before re-aggregating:
    /// an intermediate state would be overwritten before anyone rendered it,
    /// and re-running the full join per stale snapshot only burns lookups.
    /// The sequence guard discards anything older than what was last
    /// published.
    pub async fn run(mut self) -> Result<()> {
        let query = Query::collection(collections::POSTS)
            .order_by("createdAt", Direction::Desc);
        let mut sub = self.store.subscribe(&query).await?;

        while let Some(mut snapshot) = sub.next().await {
            while let Some(newer) = sub.try_next() {
                snapshot = newer;
            }
            if snapshot.seq < self.last_published {
                debug!(seq = snapshot.seq, "discarding stale snapshot");
                continue;
            }

            let aggregated = self.aggregate(&snapshot.docs).await;
            self.last_published = snapshot.seq;
            if self.tx.send(aggregated).is_err() {
                break;
            }
        }
        Ok(())
    }

    /// Resolves all posts in parallel. Order is the store's base-query order;
    /// sorting beyond that is the feed view's job.
    async fn aggregate(&self, docs: &[Document]) -> Vec<AggregatedPost> {
        let lookups = docs.iter().map(|doc| self.resolve(doc));
        join_all(lookups).await.into_iter().flatten().collect()
    }

    /// Joins one post with its nickname and live comment count. Both lookups
    /// run concurrently; either failing degrades that field for this post
    /// only.
    async fn resolve(&self, doc: &Document) -> Option<AggregatedPost> {
        let post = match Post::from_document(doc) {
            Ok(post) => post,
            Err(err) => {
                warn!(id = %doc.id, %err, "skipping malformed post document");
                return None;
            }
        };

        let (nickname, comment_count) = tokio::join!(
            nickname_or_anonymous(self.store.as_ref(), &post.author_id),
            self.count_comments(&post.id),
        );

        Some(AggregatedPost {
            post,
            nickname,
            comment_count,
        })
    }

    async fn count_comments(&self, post_id: &str) -> u64 {
        let query =
            Query::collection(collections::COMMENTS).where_eq("postId", post_id);
        match self.store.list(&query).await {
            Ok(docs) => docs.len() as u64,
            Err(err) => {
                warn!(%post_id, %err, "comment count lookup failed, defaulting to 0");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ANONYMOUS;
    use domains::document::{Snapshot, Subscription};
    use domains::error::AppError;
    use domains::ports::MockDocumentStore;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn post_doc(id: &str, author: &str) -> Document {
        let fields = json!({
            "title": format!("post {id}"),
            "content": "body",
            "category": "General",
            "authorId": author,
            "imageUrls": [],
            "views": 0,
            "commentCount": 0,
            "createdAt": "2026-08-30T12:00:00Z",
        });
        match fields {
            serde_json::Value::Object(map) => Document { id: id.to_string(), fields: map },
            _ => unreachable!(),
        }
    }

    fn user_doc(id: &str, nickname: &str) -> Document {
        let fields = json!({
            "email": "a@b.com",
            "nickname": nickname,
            "profileImage": "img",
            "createdAt": "2026-08-30T12:00:00Z",
        });
        match fields {
            serde_json::Value::Object(map) => Document { id: id.to_string(), fields: map },
            _ => unreachable!(),
        }
    }

    fn single_snapshot_subscription(docs: Vec<Document>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Snapshot { seq: 1, docs }).unwrap();
        // Sender dropped here: run() terminates after the one snapshot.
        Subscription::new(rx)
    }

    #[tokio::test]
    async fn failed_nickname_lookup_degrades_that_post_only() {
        let mut store = MockDocumentStore::new();
        let docs = vec![post_doc("p1", "u-broken"), post_doc("p2", "u-ok")];
        store
            .expect_subscribe()
            .returning(move |_| Ok(single_snapshot_subscription(docs.clone())));
        store.expect_get().returning(|_, id| match id {
            "u-broken" => Err(AppError::Internal("users shard offline".into())),
            "u-ok" => Ok(Some(user_doc("u-ok", "tester"))),
            other => panic!("unexpected lookup {other}"),
        });
        store.expect_list().returning(|_| Ok(vec![]));

        let (aggregator, mut rx) = PostAggregator::new(Arc::new(store));
        aggregator.run().await.unwrap();

        let published = rx.borrow_and_update().clone();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].nickname, ANONYMOUS);
        assert_eq!(published[1].nickname, "tester");
    }

    #[tokio::test]
    async fn failed_comment_count_defaults_to_zero() {
        let mut store = MockDocumentStore::new();
        let docs = vec![post_doc("p1", "u-ok")];
        store
            .expect_subscribe()
            .returning(move |_| Ok(single_snapshot_subscription(docs.clone())));
        store
            .expect_get()
            .returning(|_, _| Ok(Some(user_doc("u-ok", "tester"))));
        store
            .expect_list()
            .returning(|_| Err(AppError::Internal("count query failed".into())));

        let (aggregator, mut rx) = PostAggregator::new(Arc::new(store));
        aggregator.run().await.unwrap();

        let published = rx.borrow_and_update().clone();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].comment_count, 0);
    }

    #[tokio::test]
    async fn malformed_post_documents_are_skipped() {
        let mut store = MockDocumentStore::new();
        let broken = Document {
            id: "junk".to_string(),
            fields: serde_json::Map::new(),
        };
        let docs = vec![broken, post_doc("p1", "u-ok")];
        store
            .expect_subscribe()
            .returning(move |_| Ok(single_snapshot_subscription(docs.clone())));
        store
            .expect_get()
            .returning(|_, _| Ok(Some(user_doc("u-ok", "tester"))));
        store.expect_list().returning(|_| Ok(vec![]));

        let (aggregator, mut rx) = PostAggregator::new(Arc::new(store));
        aggregator.run().await.unwrap();

        let published = rx.borrow_and_update().clone();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id(), "p1");
    }

    #[tokio::test]
    async fn pending_snapshots_coalesce_to_latest() {
        let mut store = MockDocumentStore::new();
        store.expect_subscribe().returning(|_| {
            let (tx, rx) = mpsc::unbounded_channel();
            tx.send(Snapshot { seq: 1, docs: vec![post_doc("old", "u-ok")] })
                .unwrap();
            tx.send(Snapshot { seq: 2, docs: vec![post_doc("new", "u-ok")] })
                .unwrap();
            Ok(Subscription::new(rx))
        });
        // With coalescing only the newest snapshot is aggregated, so the
        // nickname lookup runs exactly once.
        store
            .expect_get()
            .times(1)
            .returning(|_, _| Ok(Some(user_doc("u-ok", "tester"))));
        store.expect_list().returning(|_| Ok(vec![]));

        let (aggregator, mut rx) = PostAggregator::new(Arc::new(store));
        aggregator.run().await.unwrap();

        let published = rx.borrow_and_update().clone();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id(), "new");
    }
}
