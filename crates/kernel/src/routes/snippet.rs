//! Snippet routes.

use axum::{
    Extension, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::info;

use super::helpers::{render, template_data};
use crate::error::{AppError, AppResult};
use crate::form::{PostForm, SnippetCreateForm};
use crate::middleware::RequestContext;
use crate::session::put_flash;
use crate::state::AppState;

/// Public snippet routes (dynamic chain).
pub fn router() -> Router<AppState> {
    Router::new().route("/snippet/view/{id}", get(view))
}

/// Snippet routes that require a logged-in user.
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/snippet/create", get(create_form).post(create_submit))
}

/// Parse a snippet id path segment. Only positive integers are ids.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id >= 1)
}

async fn view(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    session: Session,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    let id = parse_id(&raw_id).ok_or(AppError::NotFound)?;
    let snippet = state.snippets().get(id).await?;

    let mut data = template_data(&session, &ctx).await?;
    data.snippet = Some(snippet);

    render(&state, StatusCode::OK, "pages/view.html", &data)
}

async fn create_form(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    session: Session,
) -> AppResult<Response> {
    let data = template_data(&session, &ctx)
        .await?
        .with_form(&SnippetCreateForm::blank())?;

    render(&state, StatusCode::OK, "pages/create.html", &data)
}

async fn create_submit(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    session: Session,
    PostForm(mut form): PostForm<SnippetCreateForm>,
) -> AppResult<Response> {
    form.validate();
    if !form.validation.valid() {
        let data = template_data(&session, &ctx).await?.with_form(&form)?;
        return render(&state, StatusCode::UNPROCESSABLE_ENTITY, "pages/create.html", &data);
    }

    let id = state
        .snippets()
        .insert(&form.title, &form.content, form.expires)
        .await?;
    info!(snippet_id = id, user_id = ?ctx.user_id, "snippet created");

    put_flash(&session, "Snippet successfully created!").await?;
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("1"), Some(1));
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("1.5"), None);
        assert_eq!(parse_id(""), None);
    }
}
