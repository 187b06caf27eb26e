//! # MemoryDocumentStore
//!
//! In-memory implementation of the `DocumentStore` port with full-snapshot
//! live subscriptions. Every mutation re-evaluates each watched query over
//! the touched collection and delivers the complete matching document set,
//! tagged with a globally monotonic sequence number. Ids are UUIDv7; server
//! timestamps resolve to the wall clock at write time, encoded RFC 3339 with
//! fixed-width microseconds so that string order is chronological order.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use domains::document::{Document, Fields, Query, Snapshot, Subscription, WriteOp};
use domains::error::{AppError, Result};
use domains::ports::DocumentStore;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

type Collection = BTreeMap<String, Fields>;

struct Watcher {
    query: Query,
    tx: mpsc::UnboundedSender<Snapshot>,
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: DashMap<String, Collection>,
    watchers: Mutex<Vec<Watcher>>,
    seq: AtomicU64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, AtomicOrdering::SeqCst) + 1
    }

    /// Re-runs every live query on `collection` and fans the fresh snapshots
    /// out. Closed subscriptions are pruned here.
    fn notify(&self, collection: &str) {
        let mut watchers = self.watchers.lock().expect("watcher registry poisoned");
        watchers.retain(|w| !w.tx.is_closed());
        for watcher in watchers.iter() {
            if watcher.query.collection != collection {
                continue;
            }
            let snapshot = Snapshot {
                seq: self.next_seq(),
                docs: self.evaluate(&watcher.query),
            };
            // A send can only fail if the receiver dropped since the retain
            // above; the next notify prunes it.
            let _ = watcher.tx.send(snapshot);
        }
    }

    fn evaluate(&self, query: &Query) -> Vec<Document> {
        let mut docs: Vec<Document> = match self.collections.get(&query.collection) {
            Some(col) => col
                .iter()
                .filter(|(_, fields)| match &query.filter {
                    Some(f) => fields.get(&f.field) == Some(&f.equals),
                    None => true,
                })
                .map(|(id, fields)| Document {
                    id: id.clone(),
                    fields: fields.clone(),
                })
                .collect(),
            None => Vec::new(),
        };

        if let Some(order) = &query.order_by {
            docs.sort_by(|a, b| {
                let ord = cmp_field(&a.fields, &b.fields, &order.field);
                match order.direction {
                    domains::document::Direction::Asc => ord,
                    domains::document::Direction::Desc => ord.reverse(),
                }
            });
        }
        docs
    }
}

fn server_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn apply_ops(fields: &mut Fields, ops: Vec<WriteOp>) {
    for op in ops {
        match op {
            WriteOp::Set(field, value) => {
                fields.insert(field, value);
            }
            WriteOp::Increment(field, delta) => {
                let current = fields.get(&field).and_then(Value::as_i64).unwrap_or(0);
                fields.insert(field, Value::from(current + delta));
            }
            WriteOp::ServerTimestamp(field) => {
                fields.insert(field, server_timestamp());
            }
        }
    }
}

fn cmp_field(a: &Fields, b: &Fields, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(x), Some(y)) => cmp_values(x, y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .total_cmp(&y.as_f64().unwrap_or(0.0)),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self.collections.get(collection).and_then(|col| {
            col.get(id).map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            })
        }))
    }

    async fn list(&self, query: &Query) -> Result<Vec<Document>> {
        Ok(self.evaluate(query))
    }

    async fn add(&self, collection: &str, ops: Vec<WriteOp>) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        {
            let mut col = self.collections.entry(collection.to_string()).or_default();
            let mut fields = Fields::new();
            apply_ops(&mut fields, ops);
            col.insert(id.clone(), fields);
        }
        self.notify(collection);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, ops: Vec<WriteOp>) -> Result<()> {
        {
            let mut col = self.collections.entry(collection.to_string()).or_default();
            let mut fields = Fields::new();
            apply_ops(&mut fields, ops);
            col.insert(id.to_string(), fields);
        }
        self.notify(collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, ops: Vec<WriteOp>) -> Result<()> {
        {
            let mut col = self
                .collections
                .get_mut(collection)
                .ok_or_else(|| not_found(collection, id))?;
            let fields = col
                .get_mut(id)
                .ok_or_else(|| not_found(collection, id))?;
            apply_ops(fields, ops);
        }
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        {
            let mut col = self
                .collections
                .get_mut(collection)
                .ok_or_else(|| not_found(collection, id))?;
            col.remove(id).ok_or_else(|| not_found(collection, id))?;
        }
        self.notify(collection);
        Ok(())
    }

    async fn subscribe(&self, query: &Query) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Evaluate and register under the same lock: a write landing in
        // between would otherwise notify before the watcher exists and its
        // change would never reach this subscriber.
        let mut watchers = self.watchers.lock().expect("watcher registry poisoned");
        let initial = Snapshot {
            seq: self.next_seq(),
            docs: self.evaluate(query),
        };
        // The initial snapshot cannot fail: we still hold the receiver.
        let _ = tx.send(initial);
        watchers.push(Watcher {
            query: query.clone(),
            tx,
        });
        Ok(Subscription::new(rx))
    }
}

fn not_found(collection: &str, id: &str) -> AppError {
    AppError::NotFound(collection.to_string(), id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::document::{collections, Direction};

    #[tokio::test]
    async fn add_assigns_id_and_server_timestamp() {
        let store = MemoryDocumentStore::new();
        let id = store
            .add(
                collections::POSTS,
                vec![
                    WriteOp::set("title", "T"),
                    WriteOp::server_timestamp("createdAt"),
                ],
            )
            .await
            .unwrap();

        let doc = store.get(collections::POSTS, &id).await.unwrap().unwrap();
        assert_eq!(doc.fields.get("title").unwrap().as_str(), Some("T"));
        assert!(doc.fields.get("createdAt").unwrap().is_string());
    }

    #[tokio::test]
    async fn update_on_missing_document_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = store
            .update(collections::POSTS, "nope", vec![WriteOp::increment("views", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn increment_is_cumulative_and_starts_at_zero() {
        let store = MemoryDocumentStore::new();
        let id = store
            .add(collections::POSTS, vec![WriteOp::set("title", "T")])
            .await
            .unwrap();

        store
            .update(collections::POSTS, &id, vec![WriteOp::increment("views", 1)])
            .await
            .unwrap();
        store
            .update(collections::POSTS, &id, vec![WriteOp::increment("views", 2)])
            .await
            .unwrap();

        let doc = store.get(collections::POSTS, &id).await.unwrap().unwrap();
        assert_eq!(doc.fields.get("views").unwrap(), 3);
    }

    #[tokio::test]
    async fn queries_filter_and_order() {
        let store = MemoryDocumentStore::new();
        for (title, views) in [("a", 3), ("b", 1), ("c", 2)] {
            store
                .add(
                    collections::POSTS,
                    vec![
                        WriteOp::set("title", title),
                        WriteOp::set("views", views),
                        WriteOp::set("category", "General"),
                    ],
                )
                .await
                .unwrap();
        }
        store
            .add(
                collections::POSTS,
                vec![
                    WriteOp::set("title", "d"),
                    WriteOp::set("views", 9),
                    WriteOp::set("category", "Info"),
                ],
            )
            .await
            .unwrap();

        let query = Query::collection(collections::POSTS)
            .where_eq("category", "General")
            .order_by("views", Direction::Desc);
        let docs = store.list(&query).await.unwrap();
        let titles: Vec<&str> = docs
            .iter()
            .filter_map(|d| d.fields.get("title").and_then(Value::as_str))
            .collect();
        assert_eq!(titles, vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn subscription_delivers_initial_and_change_snapshots() {
        let store = MemoryDocumentStore::new();
        let query = Query::collection(collections::POSTS);
        let mut sub = store.subscribe(&query).await.unwrap();

        let initial = sub.next().await.unwrap();
        assert!(initial.docs.is_empty());

        store
            .add(collections::POSTS, vec![WriteOp::set("title", "T")])
            .await
            .unwrap();
        let changed = sub.next().await.unwrap();
        assert_eq!(changed.docs.len(), 1);
        assert!(changed.seq > initial.seq);
    }

    #[tokio::test]
    async fn subscribe_racing_a_write_never_misses_the_document() {
        use std::sync::Arc;

        for _ in 0..50 {
            let store = Arc::new(MemoryDocumentStore::new());
            let writer = {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .add(collections::POSTS, vec![WriteOp::set("title", "T")])
                        .await
                        .unwrap();
                })
            };

            let mut sub = store
                .subscribe(&Query::collection(collections::POSTS))
                .await
                .unwrap();
            writer.await.unwrap();

            // The write is either in the initial snapshot or in a pending
            // change notification; it must never fall between the two.
            let mut latest = sub.next().await.unwrap();
            while let Some(newer) = sub.try_next() {
                latest = newer;
            }
            assert_eq!(latest.docs.len(), 1);
        }
    }

    #[tokio::test]
    async fn unrelated_collections_do_not_notify() {
        let store = MemoryDocumentStore::new();
        let query = Query::collection(collections::POSTS);
        let mut sub = store.subscribe(&query).await.unwrap();
        sub.next().await.unwrap(); // initial

        store
            .add(collections::USERS, vec![WriteOp::set("nickname", "x")])
            .await
            .unwrap();
        assert!(sub.try_next().is_none());
    }
}
