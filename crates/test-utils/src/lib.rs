#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Snippetbox test utilities.
//!
//! Helpers for integration testing: a cookie-keeping client that drives a
//! router in-process, buffered responses, CSRF token scraping and simple
//! assertion helpers.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use regex::Regex;
use tower::ServiceExt;

/// Name of the session cookie set by the server.
pub const SESSION_COOKIE: &str = "id";

static CSRF_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="csrf_token"\s+value="([^"]*)""#).expect("csrf pattern is valid")
});

/// A response with its body read into memory.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Buffer a router response.
    pub async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.expect("read body").to_bytes();
        Self {
            status: parts.status,
            headers: parts.headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// A header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The redirect target, if any.
    pub fn location(&self) -> Option<&str> {
        self.header(header::LOCATION.as_str())
    }

    /// The CSRF token embedded in the page, if any.
    pub fn csrf_token(&self) -> Option<String> {
        extract_csrf_token(&self.body)
    }
}

/// Find the hidden `csrf_token` field in rendered HTML.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    CSRF_RX
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Encode pairs as an `application/x-www-form-urlencoded` body.
pub fn form_body(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Parse `Set-Cookie` headers into `(name, value)` pairs.
///
/// A cookie being cleared (empty value or `Max-Age=0`) is returned with
/// `None` as its value.
pub fn set_cookies(headers: &HeaderMap) -> Vec<(String, Option<String>)> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| {
            let mut attributes = cookie.split(';').map(str::trim);
            let (name, value) = attributes.next()?.split_once('=')?;
            let cleared =
                value.is_empty() || attributes.any(|a| a.eq_ignore_ascii_case("max-age=0"));
            Some((name.to_string(), (!cleared).then(|| value.to_string())))
        })
        .collect()
}

/// Drives a router in-process, keeping cookies between requests like a
/// browser would.
pub struct TestClient {
    router: Router,
    cookies: BTreeMap<String, String>,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            cookies: BTreeMap::new(),
        }
    }

    /// Current session cookie value.
    pub fn session_id(&self) -> Option<&str> {
        self.cookies.get(SESSION_COOKIE).map(String::as_str)
    }

    /// Forget every cookie.
    pub fn clear_cookies(&mut self) {
        self.cookies.clear();
    }

    /// Send a request with the stored cookies and record any new ones.
    pub async fn request(&mut self, mut request: Request<Body>) -> TestResponse {
        if !self.cookies.is_empty() {
            let jar = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request
                .headers_mut()
                .insert(header::COOKIE, jar.parse().expect("valid cookie header"));
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        for (name, value) in set_cookies(response.headers()) {
            match value {
                Some(value) => self.cookies.insert(name, value),
                None => self.cookies.remove(&name),
            };
        }

        TestResponse::from_response(response).await
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .expect("valid request");
        self.request(request).await
    }

    /// POST an urlencoded form exactly as given.
    pub async fn post_form(&mut self, path: &str, pairs: &[(&str, &str)]) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form_body(pairs)))
            .expect("valid request");
        self.request(request).await
    }

    /// Fetch `form_page` for a CSRF token, then POST `pairs` plus that token
    /// to `path`.
    pub async fn submit_form(
        &mut self,
        form_page: &str,
        path: &str,
        pairs: &[(&str, &str)],
    ) -> TestResponse {
        let page = self.get(form_page).await;
        let token = page
            .csrf_token()
            .unwrap_or_else(|| panic!("no csrf token on {form_page}"));

        let mut with_token = vec![("csrf_token", token.as_str())];
        with_token.extend_from_slice(pairs);
        self.post_form(path, &with_token).await
    }
}

/// Assertion helpers with readable failure output.
pub mod assertions {
    /// Assert a page contains a string.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "expected to find {needle:?} in:\n{haystack}"
        );
    }

    /// Assert a page does not contain a string.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "did not expect {needle:?} in:\n{haystack}"
        );
    }
}
