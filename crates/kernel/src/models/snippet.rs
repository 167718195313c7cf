//! Snippet model and store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use super::StoreError;

/// Number of snippets shown on the home page.
pub const LATEST_LIMIT: i64 = 10;

/// Snippet record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

/// Persistence operations for snippets.
///
/// Expired snippets are invisible to both `get` and `latest`.
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Insert a snippet that expires `expires_days` from now. Returns the new id.
    async fn insert(&self, title: &str, content: &str, expires_days: i32)
    -> Result<i64, StoreError>;

    /// Fetch a live snippet by id, or [`StoreError::NotFound`].
    async fn get(&self, id: i64) -> Result<Snippet, StoreError>;

    /// The most recently created live snippets, newest first.
    async fn latest(&self) -> Result<Vec<Snippet>, StoreError>;
}

/// PostgreSQL-backed snippet store.
#[derive(Clone)]
pub struct PgSnippetStore {
    pool: PgPool,
}

impl PgSnippetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetStore for PgSnippetStore {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
    ) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO snippets (title, content, created, expires)
            VALUES ($1, $2, now(), now() + make_interval(days => $3))
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(expires_days)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet, StoreError> {
        sqlx::query_as::<_, Snippet>(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > now() AND id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, StoreError> {
        let snippets = sqlx::query_as::<_, Snippet>(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > now() ORDER BY id DESC LIMIT $1",
        )
        .bind(LATEST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(snippets)
    }
}
