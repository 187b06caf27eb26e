//! Shared author-nickname resolution.
//!
//! A failed or missing profile lookup is a transient sub-failure: it degrades
//! to the anonymous fallback for that one caller and is logged, never
//! propagated.

use domains::document::collections;
use domains::models::UserProfile;
use domains::ports::DocumentStore;
use tracing::warn;

/// Fallback display name when a profile cannot be resolved.
pub const ANONYMOUS: &str = "anonymous";

pub(crate) async fn nickname_or_anonymous(store: &dyn DocumentStore, user_id: &str) -> String {
    match store.get(collections::USERS, user_id).await {
        Ok(Some(doc)) => match UserProfile::from_document(&doc) {
            Ok(profile) if !profile.nickname.is_empty() => profile.nickname,
            Ok(_) => ANONYMOUS.to_string(),
            Err(err) => {
                warn!(%user_id, %err, "malformed user profile, falling back to anonymous");
                ANONYMOUS.to_string()
            }
        },
        Ok(None) => ANONYMOUS.to_string(),
        Err(err) => {
            warn!(%user_id, %err, "nickname lookup failed, falling back to anonymous");
            ANONYMOUS.to_string()
        }
    }
}
