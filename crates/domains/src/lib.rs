//! # domains
//!
//! The central domain models, document primitives, and port definitions for
//! the board feed core. Adapters and services depend on this crate only.

pub mod document;
pub mod error;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use document::*;
pub use error::*;
pub use models::*;
pub use ports::*;
