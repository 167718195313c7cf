//! Session-bound CSRF tokens.
//!
//! Each session carries one random token. Rendered forms embed it as a hidden
//! field and the CSRF interceptor compares submissions against it.

use rand::RngCore;
use subtle::ConstantTimeEq;
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

/// Session key for storing the CSRF token.
pub const CSRF_SESSION_KEY: &str = "csrf_token";

/// Name of the hidden form field carrying the token.
pub const CSRF_FORM_FIELD: &str = "csrf_token";

/// Request header accepted as an alternative to the form field.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Generate a fresh random token (hex encoded, 64 chars).
pub fn generate_csrf_token() -> String {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);
    hex::encode(random_bytes)
}

/// The session's token, creating and storing one if the session has none.
pub async fn session_csrf_token(session: &Session) -> Result<String, SessionError> {
    if let Some(token) = session.get::<String>(CSRF_SESSION_KEY).await? {
        return Ok(token);
    }
    rotate_csrf_token(session).await
}

/// Replace the session's token with a fresh one.
pub async fn rotate_csrf_token(session: &Session) -> Result<String, SessionError> {
    let token = generate_csrf_token();
    session.insert(CSRF_SESSION_KEY, &token).await?;
    Ok(token)
}

/// Constant-time comparison of a submitted token against the expected one.
pub fn verify_csrf_token(expected: &str, submitted: &str) -> bool {
    if expected.is_empty() || submitted.is_empty() {
        return false;
    }
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}
