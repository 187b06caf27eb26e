//! # auth-adapters
//!
//! Argon2-backed in-memory implementation of `AuthProvider`. Accounts are
//! keyed by normalized email; at most one session is active at a time (this
//! is a single-device client, not a server).

use std::sync::RwLock;

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use async_trait::async_trait;
use dashmap::DashMap;
use domains::error::{AppError, Result};
use domains::models::AuthUser;
use domains::ports::AuthProvider;
use uuid::Uuid;

/// Minimum accepted password length, matching the managed backend this
/// adapter stands in for.
const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    id: String,
    password_hash: String,
}

#[derive(Default)]
pub struct SimpleAuthProvider {
    accounts: DashMap<String, Account>,
    session: RwLock<Option<AuthUser>>,
}

impl SimpleAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AppError::Internal(format!("password hashing failed: {err}")))
    }

    fn verify_password(password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_ascii_lowercase();
    // Minimal shape check; real deliverability is the provider's problem.
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(AppError::AuthError("malformed email address".to_string()));
    }
    Ok(email)
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::AuthError(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = Self::hash_password(password)?;
        let id = Uuid::new_v4().to_string();
        match self.accounts.entry(email.clone()) {
            dashmap::Entry::Occupied(_) => Err(AppError::AuthError(
                "an account with this email already exists".to_string(),
            )),
            dashmap::Entry::Vacant(entry) => {
                entry.insert(Account {
                    id: id.clone(),
                    password_hash,
                });
                Ok(AuthUser { id, email })
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = normalize_email(email)?;
        let user = match self.accounts.get(&email) {
            Some(account) if Self::verify_password(password, &account.password_hash) => {
                AuthUser {
                    id: account.id.clone(),
                    email,
                }
            }
            _ => {
                return Err(AppError::AuthError(
                    "invalid email or password".to_string(),
                ))
            }
        };

        *self.session.write().expect("session lock poisoned") = Some(user.clone());
        Ok(user)
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session.read().expect("session lock poisoned").clone()
    }

    fn sign_out(&self) {
        self.session.write().expect("session lock poisoned").take();
    }
}
