//! The session stage: load/save plus a fixed lifetime.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::Error as SessionError;
use tower_sessions::{Expiry, Session, SessionStore};
use tracing::debug;

use super::{Interceptor, wrap};
use crate::routes::helpers::server_error;
use crate::session::{SESSION_CREATED_AT, SessionConfig, lifetime_as_cookie_duration, manager_layer};

/// Stage name other stages depend on.
pub const SESSION_STAGE: &str = "session";

/// Build the session stage for a [`Pipeline`](super::Pipeline).
///
/// The session manager loads the session for the request's cookie (or starts
/// a new one) and persists any changes once the inner handler has answered.
/// Inside it, [`SessionLifetime`] pins each session to a fixed deadline.
pub fn session_stage<S, Store>(
    store: Store,
    config: &SessionConfig,
) -> impl FnOnce(Router<S>) -> Router<S> + Send + 'static
where
    S: Clone + Send + Sync + 'static,
    Store: SessionStore + Clone,
{
    let manager = manager_layer(store, config);
    let lifetime: Arc<dyn Interceptor> = Arc::new(SessionLifetime::new(config.lifetime));
    move |router| wrap(router, lifetime).layer(manager)
}

/// Expires sessions a fixed time after creation, regardless of activity.
#[derive(Debug, Clone)]
pub struct SessionLifetime {
    lifetime: Duration,
}

impl SessionLifetime {
    pub fn new(lifetime: Duration) -> Self {
        Self { lifetime }
    }

    async fn enforce(&self, session: &Session) -> Result<(), SessionError> {
        let now = OffsetDateTime::now_utc();
        let lifetime = lifetime_as_cookie_duration(self.lifetime);

        let created = session
            .get::<i64>(SESSION_CREATED_AT)
            .await?
            .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok());

        let created = match created {
            Some(created) if created + lifetime > now => created,
            Some(_) => {
                debug!("session lifetime elapsed, starting over");
                session.flush().await?;
                session.insert(SESSION_CREATED_AT, now.unix_timestamp()).await?;
                now
            }
            None => {
                session.insert(SESSION_CREATED_AT, now.unix_timestamp()).await?;
                now
            }
        };

        session.set_expiry(Some(Expiry::AtDateTime(created + lifetime)));
        Ok(())
    }
}

#[async_trait]
impl Interceptor for SessionLifetime {
    fn name(&self) -> &'static str {
        "session_lifetime"
    }

    async fn intercept(&self, request: Request, next: Next) -> Response {
        let Some(session) = request.extensions().get::<Session>().cloned() else {
            return server_error(anyhow::anyhow!("session lifetime check ran without a session"));
        };

        if let Err(e) = self.enforce(&session).await {
            return server_error(e.into());
        }

        next.run(request).await
    }
}
