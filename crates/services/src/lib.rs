//! # services
//!
//! The feed/join/subscription core: live post aggregation, pure feed view
//! derivation, comment threads with denormalized counter upkeep, the
//! recently-viewed tracker, and the post/account write flows. Everything here
//! talks to the outside world exclusively through the `domains` ports.

pub mod accounts;
pub mod aggregator;
pub mod comments;
pub mod feed;
pub mod posts;
pub mod recent;

mod lookup;

pub use lookup::ANONYMOUS;
