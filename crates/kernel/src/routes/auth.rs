//! Account routes (signup, login, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_sessions::Session;
use tracing::info;

use super::helpers::{render, template_data};
use crate::error::AppResult;
use crate::form::{PostForm, UserLoginForm, UserSignupForm};
use crate::middleware::RequestContext;
use crate::middleware::auth::LOGIN_PATH;
use crate::models::StoreError;
use crate::session::{log_in, log_out, put_flash};
use crate::state::AppState;

/// Where a fresh login lands.
const AFTER_LOGIN_PATH: &str = "/snippet/create";

/// Signup and login (dynamic chain).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/signup", get(signup_form).post(signup_submit))
        .route(LOGIN_PATH, get(login_form).post(login_submit))
}

/// Logout (protected chain).
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/user/logout", post(logout))
}

async fn signup_form(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    session: Session,
) -> AppResult<Response> {
    let data = template_data(&session, &ctx)
        .await?
        .with_form(&UserSignupForm::default())?;

    render(&state, StatusCode::OK, "pages/signup.html", &data)
}

async fn signup_submit(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    session: Session,
    PostForm(mut form): PostForm<UserSignupForm>,
) -> AppResult<Response> {
    form.validate();

    if form.validation.valid() {
        match state
            .users()
            .insert(&form.name, &form.email, &form.password)
            .await
        {
            Ok(()) => {
                info!(email = %form.email, "user signed up");
                put_flash(&session, "Your signup was successful. Please log in.").await?;
                return Ok(Redirect::to(LOGIN_PATH).into_response());
            }
            Err(StoreError::DuplicateEmail) => {
                form.validation
                    .add_field_error("email", "User already exists");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = template_data(&session, &ctx).await?.with_form(&form)?;
    render(&state, StatusCode::UNPROCESSABLE_ENTITY, "pages/signup.html", &data)
}

async fn login_form(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    session: Session,
) -> AppResult<Response> {
    let data = template_data(&session, &ctx)
        .await?
        .with_form(&UserLoginForm::default())?;

    render(&state, StatusCode::OK, "pages/login.html", &data)
}

/// Check credentials and move the session to the authenticated state.
///
/// Unknown email and wrong password are reported identically.
async fn login_submit(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    session: Session,
    PostForm(mut form): PostForm<UserLoginForm>,
) -> AppResult<Response> {
    form.validate();

    if form.validation.valid() {
        match state.users().authenticate(&form.email, &form.password).await {
            Ok(user_id) => {
                log_in(&session, user_id).await?;
                info!(user_id, "user logged in");
                return Ok(Redirect::to(AFTER_LOGIN_PATH).into_response());
            }
            Err(StoreError::InvalidCredentials) => {
                info!(email = %form.email, "failed login attempt");
                form.validation
                    .add_non_field_error("Invalid Email or Password");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = template_data(&session, &ctx).await?.with_form(&form)?;
    render(&state, StatusCode::UNPROCESSABLE_ENTITY, "pages/login.html", &data)
}

async fn logout(
    Extension(ctx): Extension<RequestContext>,
    session: Session,
) -> AppResult<Response> {
    log_out(&session).await?;
    info!(user_id = ?ctx.user_id, "user logged out");

    put_flash(&session, "You've been logged out successfully!").await?;
    Ok(Redirect::to("/").into_response())
}
