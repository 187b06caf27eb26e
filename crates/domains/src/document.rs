//! # Document Primitives
//!
//! The generic vocabulary of the document store port: documents, write
//! operations, queries, and live snapshot subscriptions. The store delivers a
//! full snapshot of every matching document on each relevant change, never a
//! diff; snapshots carry a monotonic sequence number so consumers can discard
//! stale completions.

use serde_json::Value;
use tokio::sync::mpsc;

/// Well-known collection names.
pub mod collections {
    pub const POSTS: &str = "posts";
    pub const COMMENTS: &str = "comments";
    pub const USERS: &str = "users";
}

pub type Fields = serde_json::Map<String, Value>;

/// A single document: an opaque id plus a schema-less field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// One field-level mutation inside an `add`/`set`/`update` call.
///
/// `Increment` maps to the store's atomic per-field numeric delta and
/// `ServerTimestamp` to store-assigned time, mirroring the usual
/// backend-as-a-service field sentinels.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Set(String, Value),
    Increment(String, i64),
    ServerTimestamp(String),
}

impl WriteOp {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        WriteOp::Set(field.to_string(), value.into())
    }

    pub fn increment(field: &str, delta: i64) -> Self {
        WriteOp::Increment(field.to_string(), delta)
    }

    pub fn server_timestamp(field: &str) -> Self {
        WriteOp::ServerTimestamp(field.to_string())
    }
}

/// Equality filter on a single field (the only predicate the store offers).
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub equals: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A query over one collection: optional equality filter, optional ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filter: Option<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn collection(name: &str) -> Self {
        Query {
            collection: name.to_string(),
            filter: None,
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filter = Some(Filter {
            field: field.to_string(),
            equals: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }
}

/// A full delivery of every document currently matching a subscribed query.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Monotonically increasing per store; later changes get larger values.
    pub seq: u64,
    pub docs: Vec<Document>,
}

/// A live snapshot stream. Dropping the subscription tears the watch down on
/// the store side.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Snapshot>,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<Snapshot>) -> Self {
        Subscription { rx }
    }

    /// Waits for the next snapshot. Returns `None` once the store side closes.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// Non-blocking poll, used to coalesce a backlog of pending snapshots.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        self.rx.try_recv().ok()
    }
}
