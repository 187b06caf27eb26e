//! # storage-adapters
//!
//! Concrete implementations of the `domains` storage ports: an in-memory
//! document store with live snapshot subscriptions (standing in for a
//! managed backend-as-a-service), and device-local key-value storage backed
//! by a JSON file or plain memory.

pub mod kv;
pub mod memory;

pub use kv::{FileKeyValueStorage, MemoryKeyValueStorage};
pub use memory::MemoryDocumentStore;
