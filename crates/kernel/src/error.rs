//! Application error types.

use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tower_sessions::session::Error as SessionError;

use crate::models::StoreError;
use crate::routes::helpers::{not_found, server_error};

/// Errors a handler can return.
///
/// Anything other than a missing record is a server fault: it is logged with
/// its cause chain and the client sees a bare 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("store operation failed")]
    Store(#[from] StoreError),

    #[error("session store failed")]
    Session(#[from] SessionError),

    #[error("failed to render template")]
    Template(#[from] tera::Error),

    #[error("failed to build template data")]
    TemplateData(#[from] serde_json::Error),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound | AppError::Store(StoreError::NotFound) => not_found(),
            AppError::Internal(e) => server_error(e),
            other => server_error(other.into()),
        }
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn test_missing_records_are_404() {
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(StoreError::NotFound).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_faults_are_500() {
        let err = AppError::from(StoreError::Other(anyhow::anyhow!("disk on fire")));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
