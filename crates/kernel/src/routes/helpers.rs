//! Shared response helpers.

use std::backtrace::Backtrace;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tower_sessions::Session;

use crate::error::AppResult;
use crate::middleware::RequestContext;
use crate::session::take_flash;
use crate::state::AppState;
use crate::theme::TemplateData;

/// Log an unexpected failure with its cause chain and a stack trace, and
/// answer 500 without revealing anything about it.
pub fn server_error(error: anyhow::Error) -> Response {
    let backtrace = Backtrace::force_capture();
    tracing::error!(error = %format!("{error:#}"), %backtrace, "internal server error");
    client_error(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Answer with `status` and its standard reason phrase as the body.
pub fn client_error(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or_default()).into_response()
}

pub fn not_found() -> Response {
    client_error(StatusCode::NOT_FOUND)
}

/// Base template data for this request. Consumes the pending flash message.
pub async fn template_data(session: &Session, ctx: &RequestContext) -> AppResult<TemplateData> {
    let flash = take_flash(session).await?;
    Ok(TemplateData::new(ctx, flash))
}

/// Render a page. The page is rendered in full before anything is sent, so
/// a template failure still produces a clean 500.
pub fn render(
    state: &AppState,
    status: StatusCode,
    page: &str,
    data: &TemplateData,
) -> AppResult<Response> {
    let html = state.theme().render(page, data)?;
    Ok((status, Html(html)).into_response())
}
