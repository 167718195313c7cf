//! In-memory stores.
//!
//! Used when no database is configured and by the test suite. Both stores are
//! safe to share across concurrent requests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;

use super::snippet::LATEST_LIMIT;
use super::user::hash_password;
use super::{Snippet, SnippetStore, StoreError, User, UserStore};

/// Snippet store backed by a vector.
#[derive(Debug, Default)]
pub struct MemorySnippetStore {
    snippets: RwLock<Vec<Snippet>>,
}

impl MemorySnippetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnippetStore for MemorySnippetStore {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
    ) -> Result<i64, StoreError> {
        let mut snippets = self.snippets.write();
        let id = snippets.last().map_or(1, |s| s.id + 1);
        let created = Utc::now();

        snippets.push(Snippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created,
            expires: created + Duration::days(i64::from(expires_days)),
        });

        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet, StoreError> {
        let now = Utc::now();
        self.snippets
            .read()
            .iter()
            .find(|s| s.id == id && s.expires > now)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, StoreError> {
        let now = Utc::now();
        Ok(self
            .snippets
            .read()
            .iter()
            .rev()
            .filter(|s| s.expires > now)
            .take(LATEST_LIMIT as usize)
            .cloned()
            .collect())
    }
}

/// User store backed by a vector.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete an account. Returns whether it existed.
    pub fn remove(&self, id: i64) -> bool {
        let mut users = self.users.write();
        let before = users.len();
        users.retain(|u| u.id != id);
        users.len() != before
    }

    /// Look up an account id by email.
    pub fn id_for_email(&self, email: &str) -> Option<i64> {
        self.users
            .read()
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.id)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), StoreError> {
        // Hash before taking the lock; argon2 is deliberately slow.
        let hashed_password = hash_password(password)?;

        let mut users = self.users.write();
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        users.push(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            hashed_password,
            created: Utc::now(),
        });

        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, StoreError> {
        let user = self.users.read().iter().find(|u| u.email == email).cloned();

        match user {
            Some(user) if user.verify_password(password) => Ok(user.id),
            _ => Err(StoreError::InvalidCredentials),
        }
    }

    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.users.read().iter().any(|u| u.id == id))
    }
}
