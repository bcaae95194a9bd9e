// db/userdb.rs
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{User, STARTING_POINTS};

#[async_trait]
pub trait UserExt {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error>;

    /// Returns the user registered under `email`, creating it with the
    /// starting balance when absent. Never creates a second record for an
    /// email.
    async fn find_or_create_user(
        &self,
        name: &str,
        email: &str,
        avatar: Option<&str>,
    ) -> Result<User, sqlx::Error>;
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, avatar, points, created_at FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, avatar, points, created_at FROM users WHERE email = ?",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, avatar, points, created_at FROM users ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn find_or_create_user(
        &self,
        name: &str,
        email: &str,
        avatar: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        let email = normalize_email(email);

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, avatar, points, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name.trim())
        .bind(email.as_str())
        .bind(avatar)
        .bind(STARTING_POINTS)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 1 {
            tracing::info!(%email, "created user with {} starting points", STARTING_POINTS);
        }

        self.get_user_by_email(&email)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}
