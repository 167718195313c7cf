//! Front page and liveness routes.

use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::get,
};
use tower_sessions::Session;

use super::helpers::{render, template_data};
use crate::error::AppResult;
use crate::middleware::RequestContext;
use crate::state::AppState;

/// Front page router (dynamic chain).
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}

/// Liveness router (outer chain only; no session is touched).
pub fn ping_router() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}

/// Front page: the latest snippets, newest first.
async fn home(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    session: Session,
) -> AppResult<Response> {
    let snippets = state.snippets().latest().await?;

    let mut data = template_data(&session, &ctx).await?;
    data.snippets = snippets;

    render(&state, StatusCode::OK, "pages/home.html", &data)
}

async fn ping() -> &'static str {
    "OK"
}
