//! HTTP route handlers and the application router.
//!
//! Routes are grouped by the interceptor chain they run behind:
//!
//! - outer: `recover_panic`, `log_request`, `secure_headers` (everything)
//! - dynamic: outer + `session`, `csrf`, `authenticate` (pages)
//! - protected: dynamic + `require_authentication`

pub mod auth;
pub mod front;
pub mod helpers;
pub mod snippet;
pub mod static_files;

use axum::Router;
use axum::response::Response;
use tower_sessions::SessionStore;

use crate::middleware::session::{SESSION_STAGE, session_stage};
use crate::middleware::{
    Authenticate, CsrfCheck, LogRequest, Pipeline, PipelineError, RecoverPanic,
    RequireAuthentication, SecureHeaders,
};
use crate::session::SessionConfig;
use crate::state::AppState;

/// Build the complete application router.
///
/// Fails if any chain is ordered so that a stage runs outside a stage it
/// depends on.
pub fn app<Store>(
    state: AppState,
    session_store: Store,
    session_config: &SessionConfig,
) -> Result<Router, PipelineError>
where
    Store: SessionStore + Clone,
{
    let outer: Pipeline<AppState> = Pipeline::new()
        .interceptor(RecoverPanic)
        .interceptor(LogRequest)
        .interceptor(SecureHeaders);

    let dynamic: Pipeline<AppState> = Pipeline::new()
        .stage(SESSION_STAGE, &[], session_stage(session_store, session_config))
        .interceptor(CsrfCheck)
        .interceptor(Authenticate::new(state.users().clone()));

    let protected: Pipeline<AppState> = Pipeline::new().interceptor(RequireAuthentication);

    let outer_names = outer.names();
    let dynamic_names: Vec<_> = outer_names.iter().chain(&dynamic.names()).copied().collect();

    let protected_routes = protected.apply(
        Router::new()
            .merge(snippet::protected_router())
            .merge(auth::protected_router()),
        &dynamic_names,
    )?;

    let dynamic_routes = dynamic.apply(
        Router::new()
            .merge(front::router())
            .merge(snippet::router())
            .merge(auth::router())
            .merge(protected_routes),
        &outer_names,
    )?;

    let app = outer.apply(
        Router::new()
            .merge(front::ping_router())
            .merge(static_files::router())
            .merge(dynamic_routes)
            .fallback(fallback),
        &[],
    )?;

    Ok(app.with_state(state))
}

async fn fallback() -> Response {
    helpers::not_found()
}
