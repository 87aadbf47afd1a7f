//! # User Repository
//!
//! Accounts backing the authenticated customer identity. Passwords arrive
//! here already hashed.

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::User;
use tracing::debug;

use super::generate_id;
use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Errors
    /// `UniqueViolation` on a taken username or email.
    pub async fn insert(&self, username: &str, email: &str, password_hash: &str) -> DbResult<User> {
        let user = User {
            id: generate_id(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %user.id, username = %user.username, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let err = DbError::from(e);
            let email_taken =
                matches!(&err, DbError::UniqueViolation { field, .. } if field == "email");
            if email_taken {
                err.with_duplicate_value(email)
            } else {
                err.with_duplicate_value(username)
            }
        })?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email or username (login accepts either).
    pub async fn find_by_login(&self, login: &str) -> DbResult<Option<User>> {
        let login = login.trim();

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = lower(?1) OR username = ?1"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
