//! CSRF protection.

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;
use tracing::warn;

use super::Interceptor;
use super::session::SESSION_STAGE;
use crate::form::csrf::{CSRF_FORM_FIELD, CSRF_HEADER, session_csrf_token, verify_csrf_token};
use crate::routes::helpers::{client_error, server_error};

/// Largest body the CSRF stage buffers while looking for the token.
const MAX_FORM_BYTES: usize = 2 * 1024 * 1024;

/// The session's CSRF token, exposed to inner stages and handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

/// Rejects state-changing requests that do not carry the session's token.
///
/// Safe methods pass through; every request gets the token (created on first
/// use) in its extensions so pages can embed it.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsrfCheck;

#[async_trait]
impl Interceptor for CsrfCheck {
    fn name(&self) -> &'static str {
        "csrf"
    }

    fn requires(&self) -> &'static [&'static str] {
        &[SESSION_STAGE]
    }

    async fn intercept(&self, request: Request, next: Next) -> Response {
        let Some(session) = request.extensions().get::<Session>().cloned() else {
            return server_error(anyhow::anyhow!("CSRF check ran without a session"));
        };

        let expected = match session_csrf_token(&session).await {
            Ok(token) => token,
            Err(e) => return server_error(e.into()),
        };

        let mut request = request;
        if is_state_changing(request.method()) {
            let (buffered, submitted) = match submitted_token(request).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(error = %e, "failed to read request body for CSRF check");
                    return client_error(StatusCode::BAD_REQUEST);
                }
            };

            if !verify_csrf_token(&expected, submitted.as_deref().unwrap_or_default()) {
                warn!(
                    method = %buffered.method(),
                    uri = %buffered.uri(),
                    token_present = submitted.is_some(),
                    "CSRF token mismatch"
                );
                return client_error(StatusCode::BAD_REQUEST);
            }
            request = buffered;
        }

        request.extensions_mut().insert(CsrfToken(expected));
        next.run(request).await
    }
}

fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Find the submitted token in the header or the form body.
///
/// The body is buffered and handed back inside a rebuilt request so the
/// handler can still read it.
async fn submitted_token(request: Request) -> anyhow::Result<(Request, Option<String>)> {
    if let Some(token) = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        let token = token.to_string();
        return Ok((request, Some(token)));
    }

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES).await?;

    let token = if content_type.starts_with("application/x-www-form-urlencoded") {
        url::form_urlencoded::parse(&bytes)
            .find(|(name, _)| name == CSRF_FORM_FIELD)
            .map(|(_, value)| value.into_owned())
    } else if content_type.starts_with("multipart/form-data") {
        multipart_token(&parts, bytes.clone()).await?
    } else {
        None
    };

    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

async fn multipart_token(
    parts: &axum::http::request::Parts,
    bytes: Bytes,
) -> anyhow::Result<Option<String>> {
    let mut copy = Request::new(Body::from(bytes));
    *copy.method_mut() = parts.method.clone();
    *copy.headers_mut() = parts.headers.clone();

    let mut multipart = Multipart::from_request(copy, &())
        .await
        .map_err(|e| anyhow::anyhow!(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| anyhow::anyhow!(e.body_text()))?
    {
        if field.name() == Some(CSRF_FORM_FIELD) {
            let token = field
                .text()
                .await
                .map_err(|e| anyhow::anyhow!(e.body_text()))?;
            return Ok(Some(token));
        }
    }

    Ok(None)
}
