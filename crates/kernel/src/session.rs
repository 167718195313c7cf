//! Session configuration and the per-session state the application keeps.

use std::time::Duration;

use anyhow::{Context, Result};
use fred::prelude::*;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration as CookieDuration;
use tower_sessions::session::Error as SessionError;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};
use tower_sessions_redis_store::RedisStore;

use crate::config::Config as AppConfig;
use crate::form::rotate_csrf_token;

/// Session key for storing the authenticated user ID.
pub const SESSION_USER_ID: &str = "authenticated_user_id";

/// Session key for the one-shot flash message.
pub const SESSION_FLASH: &str = "flash";

/// Session key recording when the session was created (unix seconds).
pub const SESSION_CREATED_AT: &str = "created_at";

/// Default session lifetime (12 hours).
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(12 * 3600);

/// Cookie and lifetime settings for the session stage.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed lifetime measured from session creation, independent of activity.
    pub lifetime: Duration,
    /// Send the cookie only over HTTPS.
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime: DEFAULT_SESSION_LIFETIME,
            secure: true,
        }
    }
}

impl From<&AppConfig> for SessionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            lifetime: config.session_lifetime,
            secure: config.cookie_secure,
        }
    }
}

/// Build the session manager layer around any store.
///
/// The expiry configured here is a placeholder; the session stage pins every
/// session to its creation time plus [`SessionConfig::lifetime`].
pub fn manager_layer<Store>(store: Store, config: &SessionConfig) -> SessionManagerLayer<Store>
where
    Store: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_secure(config.secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(lifetime_as_cookie_duration(
            config.lifetime,
        )))
}

pub(crate) fn lifetime_as_cookie_duration(lifetime: Duration) -> CookieDuration {
    CookieDuration::seconds(i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX))
}

/// Connect to Redis and return a session store backed by it.
pub async fn redis_store(redis_url: &str) -> Result<RedisStore<Pool>> {
    let config = Config::from_url(redis_url).context("failed to parse Redis URL")?;

    let pool = Builder::from_config(config)
        .build_pool(1)
        .context("failed to create Redis pool")?;

    pool.init()
        .await
        .context("failed to connect to Redis for sessions")?;

    Ok(RedisStore::new(pool))
}

/// The user id stored in the session, if any.
pub async fn authenticated_user_id(session: &Session) -> Result<Option<i64>, SessionError> {
    session.get::<i64>(SESSION_USER_ID).await
}

/// Move the session to the authenticated state.
///
/// The token is renewed before the identity is written so a token obtained
/// before login can never carry the new identity. The CSRF token is rotated
/// with it.
pub async fn log_in(session: &Session, user_id: i64) -> Result<(), SessionError> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_ID, user_id).await?;
    rotate_csrf_token(session).await?;
    Ok(())
}

/// Move the session back to the anonymous state.
///
/// Renews the token first, then clears the identity.
pub async fn log_out(session: &Session) -> Result<(), SessionError> {
    session.cycle_id().await?;
    session.remove::<i64>(SESSION_USER_ID).await?;
    rotate_csrf_token(session).await?;
    Ok(())
}

/// Drop the identity without renewing the token.
///
/// Used when the identity no longer refers to an existing user.
pub async fn forget_user(session: &Session) -> Result<(), SessionError> {
    session.remove::<i64>(SESSION_USER_ID).await?;
    Ok(())
}

/// Store a message to show on the next rendered page.
pub async fn put_flash(session: &Session, message: &str) -> Result<(), SessionError> {
    session.insert(SESSION_FLASH, message).await
}

/// Take the pending flash message, clearing it.
pub async fn take_flash(session: &Session) -> Result<Option<String>, SessionError> {
    session.remove::<String>(SESSION_FLASH).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_log_in_then_out() {
        let session = session();
        assert_eq!(authenticated_user_id(&session).await.unwrap(), None);

        log_in(&session, 7).await.unwrap();
        assert_eq!(authenticated_user_id(&session).await.unwrap(), Some(7));

        log_out(&session).await.unwrap();
        assert_eq!(authenticated_user_id(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_log_in_rotates_csrf_token() {
        let session = session();
        let before = crate::form::session_csrf_token(&session).await.unwrap();
        log_in(&session, 1).await.unwrap();
        let after = crate::form::session_csrf_token(&session).await.unwrap();
        assert_ne!(before, after);
    }

    #[tokio::test]
    async fn test_flash_is_one_shot() {
        let session = session();
        put_flash(&session, "Snippet successfully created!").await.unwrap();

        assert_eq!(
            take_flash(&session).await.unwrap().as_deref(),
            Some("Snippet successfully created!")
        );
        assert_eq!(take_flash(&session).await.unwrap(), None);
    }

    #[test]
    fn test_lifetime_conversion() {
        let d = lifetime_as_cookie_duration(DEFAULT_SESSION_LIFETIME);
        assert_eq!(d.whole_hours(), 12);
    }
}
