//! Registration and login on top of the user repository.
//!
//! Hashing runs on the blocking pool; the repository only ever receives hashes.

use std::sync::{Arc, OnceLock};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::NewUser;
use crate::repository::UserRepository;
use crate::repository::user::DUPLICATE_EMAIL_MESSAGE;

/// bcrypt work factor for new hashes.
pub const HASH_COST: u32 = 10;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub user_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<i64> {
        let (Some(full_name), Some(email), Some(password), Some(user_type)) = (
            non_empty(input.full_name),
            non_empty(input.email),
            non_empty(input.password),
            non_empty(input.user_type),
        ) else {
            return Err(Error::validation("All fields are required."));
        };

        if !email.contains('@') || !email.contains('.') {
            return Err(Error::validation("Invalid email format."));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long."
            )));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(Error::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()));
        }

        let password_hash = blocking(move || bcrypt::hash(password, HASH_COST)).await??;
        let id = self
            .users
            .create(NewUser {
                full_name,
                email,
                phone: non_empty(input.phone),
                password_hash,
                user_type,
            })
            .await?;

        info!(user_id = id, "user registered");
        Ok(id)
    }

    /// Returns the user id on success. Unknown email and wrong password are indistinguishable.
    pub async fn login(&self, input: LoginInput) -> Result<i64> {
        let (Some(email), Some(password)) = (non_empty(input.email), non_empty(input.password))
        else {
            return Err(Error::validation("Email and password are required."));
        };

        let Some(user) = self.users.find_by_email(&email).await? else {
            // Same amount of hashing work as a real check.
            blocking(move || {
                let _ = bcrypt::verify(password, dummy_hash());
            })
            .await?;
            warn!("login rejected");
            return Err(Error::Auth);
        };

        let stored = user.password_hash.clone();
        let valid = blocking(move || bcrypt::verify(password, &stored)).await??;
        if !valid {
            warn!(user_id = user.id, "login rejected");
            return Err(Error::Auth);
        }

        info!(user_id = user.id, "login succeeded");
        Ok(user.id)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| bcrypt::hash("not-a-real-password", HASH_COST).unwrap_or_default())
}

async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(e.to_string()))
}
