//! Static file serving.

use std::path::Path as FsPath;

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::fs;
use tracing::warn;

use super::helpers::not_found;
use crate::state::AppState;

/// Create the static files router.
pub fn router() -> Router<AppState> {
    Router::new().route("/static/{*path}", get(serve_static))
}

/// Serve a file from the static directory.
async fn serve_static(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    // Security: prevent path traversal
    let path = path.trim_start_matches('/');
    if path.is_empty() || path.contains("..") || path.contains('\0') {
        return not_found();
    }

    let file_path = state.static_dir().join(path);

    match fs::metadata(&file_path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return not_found(),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %file_path.display(), error = %e, "failed to stat static file");
            }
            return not_found();
        }
    }

    let content = match fs::read(&file_path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %file_path.display(), error = %e, "failed to read static file");
            return not_found();
        }
    };

    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(mime_from_path(&file_path)),
            ),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=86400"),
            ),
        ],
        content,
    )
        .into_response()
}

fn mime_from_path(path: &FsPath) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("html") => "text/html",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
