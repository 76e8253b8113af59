use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{NewUser, User};
use crate::repository::traits::UserRepository;

pub const DUPLICATE_EMAIL_MESSAGE: &str = "This email is already registered.";

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, full_name, email, phone, password_hash, user_type, is_verified, created_at \
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO users (full_name, email, phone, password_hash, user_type, is_verified, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.user_type)
        .bind(false)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if duplicate {
                Error::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string())
            } else {
                Error::Storage(e)
            }
        })?;

        let id = result.last_insert_rowid();
        info!(user_id = id, user_type = %user.user_type, "user created");
        Ok(id)
    }
}
