//! # Account Flow
//!
//! Signup, login, and the current-profile join. The auth provider owns
//! credentials and the session; this service only layers the `users` profile
//! document on top.

use std::sync::Arc;

use domains::document::{collections, WriteOp};
use domains::error::{AppError, Result};
use domains::models::{AuthUser, UserProfile};
use domains::ports::{AuthProvider, DocumentStore};

/// Placeholder shown until the user picks a profile image.
pub const DEFAULT_PROFILE_IMAGE: &str =
    "https://cdn-icons-png.flaticon.com/512/149/149071.png";

/// Everything the signup form collects.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub nickname: String,
    pub profile_image: Option<String>,
}

pub struct AccountService {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
}

impl AccountService {
    pub fn new(store: Arc<dyn DocumentStore>, auth: Arc<dyn AuthProvider>) -> Self {
        AccountService { store, auth }
    }

    /// Registers the account and writes the profile document keyed by the
    /// auth id.
    pub async fn sign_up(&self, form: &SignupForm) -> Result<AuthUser> {
        if form.password != form.confirm_password {
            return Err(AppError::ValidationError(
                "passwords do not match".to_string(),
            ));
        }

        let user = self.auth.sign_up(&form.email, &form.password).await?;

        let profile_image = form
            .profile_image
            .clone()
            .unwrap_or_else(|| DEFAULT_PROFILE_IMAGE.to_string());
        self.store
            .set(
                collections::USERS,
                &user.id,
                vec![
                    WriteOp::set("email", user.email.as_str()),
                    WriteOp::set("nickname", form.nickname.as_str()),
                    WriteOp::set("profileImage", profile_image),
                    WriteOp::server_timestamp("createdAt"),
                ],
            )
            .await?;

        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.auth.sign_in(email, password).await
    }

    pub fn sign_out(&self) {
        self.auth.sign_out()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.auth.current_user()
    }

    /// The signed-in user's profile, or `None` when nobody is signed in or
    /// the profile document was never written.
    pub async fn current_profile(&self) -> Result<Option<UserProfile>> {
        let Some(user) = self.auth.current_user() else {
            return Ok(None);
        };
        match self.store.get(collections::USERS, &user.id).await? {
            Some(doc) => Ok(Some(UserProfile::from_document(&doc)?)),
            None => Ok(None),
        }
    }
}
