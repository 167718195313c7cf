//! Authentication state and the route gate that depends on it.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;
use tracing::debug;

use super::csrf::CsrfToken;
use super::session::SESSION_STAGE;
use super::Interceptor;
use crate::models::UserStore;
use crate::routes::helpers::server_error;
use crate::session::{authenticated_user_id, forget_user};

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/user/login";

/// Per-request view of who is asking, derived fresh on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub is_authenticated: bool,
    pub user_id: Option<i64>,
    pub csrf_token: String,
}

/// Derives [`RequestContext`] from the session.
///
/// An identity pointing at a user that no longer exists is dropped from the
/// session and the request proceeds anonymously.
pub struct Authenticate {
    users: Arc<dyn UserStore>,
}

impl Authenticate {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Interceptor for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn requires(&self) -> &'static [&'static str] {
        &[SESSION_STAGE]
    }

    async fn intercept(&self, mut request: Request, next: Next) -> Response {
        let Some(session) = request.extensions().get::<Session>().cloned() else {
            return server_error(anyhow::anyhow!("authenticate ran without a session"));
        };

        let stored = match authenticated_user_id(&session).await {
            Ok(id) => id,
            Err(e) => return server_error(e.into()),
        };

        let user_id = match stored {
            Some(id) => match self.users.exists(id).await {
                Ok(true) => Some(id),
                Ok(false) => {
                    debug!(user_id = id, "session refers to a missing user, treating as anonymous");
                    if let Err(e) = forget_user(&session).await {
                        return server_error(e.into());
                    }
                    None
                }
                Err(e) => return server_error(e.into()),
            },
            None => None,
        };

        let csrf_token = request
            .extensions()
            .get::<CsrfToken>()
            .map(|t| t.0.clone())
            .unwrap_or_default();

        request.extensions_mut().insert(RequestContext {
            is_authenticated: user_id.is_some(),
            user_id,
            csrf_token,
        });

        next.run(request).await
    }
}

/// Gate for protected routes: anonymous requests are redirected to the login
/// page and never reach the handler.
///
/// Responses to authenticated requests are marked `Cache-Control: no-store`
/// so shared caches never hold user-specific pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequireAuthentication;

#[async_trait]
impl Interceptor for RequireAuthentication {
    fn name(&self) -> &'static str {
        "require_authentication"
    }

    fn requires(&self) -> &'static [&'static str] {
        &["authenticate"]
    }

    async fn intercept(&self, request: Request, next: Next) -> Response {
        let authenticated = request
            .extensions()
            .get::<RequestContext>()
            .is_some_and(|ctx| ctx.is_authenticated);

        if !authenticated {
            return Redirect::to(LOGIN_PATH).into_response();
        }

        let mut response = next.run(request).await;
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}
