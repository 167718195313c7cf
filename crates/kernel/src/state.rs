//! Application state shared across handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::models::{
    MemorySnippetStore, MemoryUserStore, PgSnippetStore, PgUserStore, SnippetStore, UserStore,
};
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap. Nothing in here is mutated
/// after start-up; stores handle their own synchronisation.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    snippets: Arc<dyn SnippetStore>,
    users: Arc<dyn UserStore>,

    /// Compiled page templates.
    theme: ThemeEngine,

    /// Root of the static asset tree.
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        snippets: Arc<dyn SnippetStore>,
        users: Arc<dyn UserStore>,
        theme: ThemeEngine,
        static_dir: PathBuf,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                snippets,
                users,
                theme,
                static_dir,
            }),
        }
    }

    /// Build state from configuration.
    ///
    /// Uses PostgreSQL when `DATABASE_URL` is set, in-memory stores otherwise.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let theme = ThemeEngine::new(&config.templates_dir).context("failed to load templates")?;

        let (snippets, users): (Arc<dyn SnippetStore>, Arc<dyn UserStore>) =
            match &config.database_url {
                Some(url) => {
                    let pool = db::create_pool(url, config.database_max_connections)
                        .await
                        .context("failed to connect to database")?;
                    info!("connected to PostgreSQL");
                    (
                        Arc::new(PgSnippetStore::new(pool.clone())),
                        Arc::new(PgUserStore::new(pool)),
                    )
                }
                None => {
                    warn!("DATABASE_URL not set, using in-memory stores; data is lost on restart");
                    (
                        Arc::new(MemorySnippetStore::new()),
                        Arc::new(MemoryUserStore::new()),
                    )
                }
            };

        Ok(Self::new(snippets, users, theme, config.static_dir.clone()))
    }

    pub fn snippets(&self) -> &Arc<dyn SnippetStore> {
        &self.inner.snippets
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.inner.users
    }

    /// Get the theme engine.
    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    pub fn static_dir(&self) -> &Path {
        &self.inner.static_dir
    }
}
