//! Security response headers.

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;

use super::Interceptor;

const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (
        header::CONTENT_SECURITY_POLICY,
        "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com",
    ),
    (header::REFERRER_POLICY, "origin-when-cross-origin"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "deny"),
    (header::X_XSS_PROTECTION, "0"),
];

/// Set every hardening header, replacing any value already present.
pub(crate) fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

/// Adds browser hardening headers to every response that passes through,
/// error responses included. A handler cannot weaken them.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecureHeaders;

#[async_trait]
impl Interceptor for SecureHeaders {
    fn name(&self) -> &'static str {
        "secure_headers"
    }

    async fn intercept(&self, request: Request, next: Next) -> Response {
        let mut response = next.run(request).await;
        apply_security_headers(response.headers_mut());
        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::Pipeline;

    #[test]
    fn apply_sets_all_headers() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers);
        assert_eq!(headers.len(), SECURITY_HEADERS.len());
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_XSS_PROTECTION], "0");
    }

    #[tokio::test]
    async fn handler_values_are_overridden() {
        let router: Router = Router::new().route(
            "/",
            get(|| async {
                (
                    [
                        (header::X_FRAME_OPTIONS, "sameorigin"),
                        (header::CONTENT_SECURITY_POLICY, "default-src *"),
                    ],
                    "framed",
                )
            }),
        );
        let router = Pipeline::new()
            .interceptor(SecureHeaders)
            .apply(router, &[])
            .unwrap();

        let response = router
            .oneshot(axum::http::Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::X_FRAME_OPTIONS], "deny");
        assert_eq!(
            headers.get_all(header::X_FRAME_OPTIONS).iter().count(),
            1
        );
        assert_eq!(
            headers[header::CONTENT_SECURITY_POLICY],
            SECURITY_HEADERS[0].1
        );
    }
}
