//! Snippet and user records and the stores that persist them.
//!
//! Handlers and interceptors only see the [`SnippetStore`] and [`UserStore`]
//! traits. PostgreSQL-backed implementations live next to each record type;
//! the [`memory`] module provides process-local implementations used for
//! development and tests.

pub mod memory;
pub mod snippet;
pub mod user;

pub use memory::{MemorySnippetStore, MemoryUserStore};
pub use snippet::{PgSnippetStore, Snippet, SnippetStore};
pub use user::{PgUserStore, User, UserStore};

use thiserror::Error;

/// Outcomes a store can report.
///
/// The first three variants are expected domain results that handlers turn
/// into specific responses; the rest are faults.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no matching record found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
