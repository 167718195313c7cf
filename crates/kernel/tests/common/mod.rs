#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Builds the REAL application router (real interceptors, real handlers, the
//! repository's templates) over in-memory stores, so each test gets an
//! isolated app without any external services.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use parking_lot::Mutex;
use tower_sessions::MemoryStore;

use snippetbox_kernel::models::{MemorySnippetStore, MemoryUserStore, SnippetStore};
use snippetbox_kernel::theme::ThemeEngine;
use snippetbox_kernel::{AppState, SessionConfig, app};
use snippetbox_test_utils::{TestClient, TestResponse};

/// Repository root (tests run from crates/kernel/).
pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .map(PathBuf::from)
        .expect("kernel crate lives two levels below the repository root")
}

/// Cookie settings for tests: plain HTTP, default lifetime.
pub fn session_config() -> SessionConfig {
    SessionConfig {
        secure: false,
        ..SessionConfig::default()
    }
}

/// Test application wrapper using the real router and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_snippet_store(Arc::new(MemorySnippetStore::new()))
    }

    /// Build the app around a specific snippet store.
    pub fn with_snippet_store(snippets: Arc<dyn SnippetStore>) -> Self {
        let root = project_root();
        let theme = ThemeEngine::new(&root.join("templates")).expect("templates compile");
        let users = Arc::new(MemoryUserStore::new());

        let state = AppState::new(snippets, users.clone(), theme, root.join("static"));
        let router = app(state.clone(), MemoryStore::default(), &session_config())
            .expect("pipelines are well ordered");

        Self {
            router,
            state,
            users,
        }
    }

    /// A fresh browser with an empty cookie jar.
    pub fn client(&self) -> TestClient {
        TestClient::new(self.router.clone())
    }

    /// Create an account through the signup page.
    pub async fn sign_up(
        &self,
        client: &mut TestClient,
        name: &str,
        email: &str,
        password: &str,
    ) -> TestResponse {
        client
            .submit_form(
                "/user/signup",
                "/user/signup",
                &[("name", name), ("email", email), ("password", password)],
            )
            .await
    }

    /// Log in through the login page.
    pub async fn log_in(&self, client: &mut TestClient, email: &str, password: &str) -> TestResponse {
        client
            .submit_form(
                "/user/login",
                "/user/login",
                &[("email", email), ("password", password)],
            )
            .await
    }

    /// Sign up and log in, returning a client holding an authenticated
    /// session.
    pub async fn logged_in_client(&self, email: &str) -> TestClient {
        let mut client = self.client();
        let signup = self.sign_up(&mut client, "Test User", email, "pa55word!").await;
        assert_eq!(signup.status, axum::http::StatusCode::SEE_OTHER);

        let login = self.log_in(&mut client, email, "pa55word!").await;
        assert_eq!(login.location(), Some("/snippet/create"));
        client
    }
}

/// In-memory sink for log output.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route this thread's log events into a buffer until the guard drops.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
