//! User model, password hashing and store.

use anyhow::Result;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use super::StoreError;

/// User record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub created: DateTime<Utc>,
}

impl User {
    /// Verify a plaintext password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(&self.hashed_password, password)
    }
}

/// Persistence operations for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account. Fails with [`StoreError::DuplicateEmail`] if the
    /// email is already registered.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), StoreError>;

    /// Check credentials and return the user id, or
    /// [`StoreError::InvalidCredentials`].
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, StoreError>;

    /// Whether a user with this id still exists.
    async fn exists(&self, id: i64) -> Result<bool, StoreError>;
}

/// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), StoreError> {
        let hashed_password = hash_password(password)?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, hashed_password, created)
            VALUES ($1, $2, $3, now())
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&hashed_password)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, hashed_password, created FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match user {
            Some(user) if user.verify_password(password) => Ok(user.id),
            _ => Err(StoreError::InvalidCredentials),
        }
    }

    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT true FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a password against an encoded Argon2 hash.
pub fn verify_password(hash: &str, password: &str) -> bool {
    if hash.is_empty() {
        return false;
    }

    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
