//! Request body binding for HTML form submissions.

use axum::Form;
use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::routes::helpers::client_error;

/// Failure to turn a request body into a form value.
///
/// The destination form is only constructed on success, so a handler that
/// receives this error has nothing half-populated to look at.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("unsupported content type {0:?}")]
    UnsupportedContentType(String),

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("failed to decode form: {0}")]
    Decode(String),
}

impl IntoResponse for BindError {
    fn into_response(self) -> Response {
        debug!(error = %self, "form binding failed");
        client_error(StatusCode::BAD_REQUEST)
    }
}

/// Extractor that decodes an urlencoded or multipart POST body into `T`.
///
/// Unknown fields are ignored and missing fields take the form's defaults;
/// values that do not fit the target type reject the whole submission with a
/// 400.
pub struct PostForm<T>(pub T);

impl<T, S> FromRequest<S> for PostForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BindError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match media_type(&req).as_str() {
            "application/x-www-form-urlencoded" => decode_urlencoded(req).await,
            "multipart/form-data" => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| BindError::Multipart(e.body_text()))?;
                let encoded = flatten_multipart(multipart).await?;
                decode_urlencoded(urlencoded_request(encoded)?).await
            }
            other => Err(BindError::UnsupportedContentType(other.to_string())),
        }
    }
}

/// The request's media type without parameters, lowercased.
fn media_type(req: &Request) -> String {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

async fn decode_urlencoded<T: DeserializeOwned>(req: Request) -> Result<PostForm<T>, BindError> {
    let Form(value) = Form::<T>::from_request(req, &())
        .await
        .map_err(|e| BindError::Decode(e.body_text()))?;
    Ok(PostForm(value))
}

/// Re-encode the text parts of a multipart body as `application/x-www-form-urlencoded`.
///
/// File parts are skipped. Pairs are collected first and encoded after the
/// last await; the serializer is not `Send`.
async fn flatten_multipart(mut multipart: Multipart) -> Result<String, BindError> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BindError::Multipart(e.body_text()))?
    {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| BindError::Multipart(e.body_text()))?;
        pairs.push((name, value));
    }

    Ok(url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish())
}

fn urlencoded_request(encoded: String) -> Result<Request, BindError> {
    Request::builder()
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(encoded))
        .map_err(|e| BindError::Multipart(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        title: String,
        expires: i32,
    }

    fn post(content_type: &str, body: impl Into<Body>) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    async fn bind(req: Request) -> Result<Sample, BindError> {
        PostForm::<Sample>::from_request(req, &()).await.map(|f| f.0)
    }

    #[tokio::test]
    async fn test_urlencoded_body_binds() {
        let form = bind(post(
            "application/x-www-form-urlencoded",
            "title=Hello+there&expires=7",
        ))
        .await
        .unwrap();
        assert_eq!(form.title, "Hello there");
        assert_eq!(form.expires, 7);
    }

    #[tokio::test]
    async fn test_unknown_fields_are_ignored_and_missing_fields_default() {
        let form = bind(post(
            "application/x-www-form-urlencoded; charset=UTF-8",
            "csrf_token=abc&title=x",
        ))
        .await
        .unwrap();
        assert_eq!(form.title, "x");
        assert_eq!(form.expires, 0);
    }

    #[tokio::test]
    async fn test_type_mismatch_is_a_bind_error() {
        let err = bind(post(
            "application/x-www-form-urlencoded",
            "title=x&expires=forever",
        ))
        .await
        .unwrap_err();
        assert!(matches!(err, BindError::Decode(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_content_type() {
        let err = bind(post("application/json", r#"{"title":"x"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, BindError::UnsupportedContentType(ref t) if t == "application/json"));
    }

    #[test]
    fn test_extractor_future_is_send() {
        fn assert_send<F: std::future::Future + Send>(_: F) {}
        let req = post("application/x-www-form-urlencoded", "title=x");
        assert_send(PostForm::<Sample>::from_request(req, &()));
        assert_send(flatten_empty_multipart());
    }

    async fn flatten_empty_multipart() {
        let req = post("multipart/form-data; boundary=XyZ", "--XyZ--\r\n");
        if let Ok(multipart) = Multipart::from_request(req, &()).await {
            let _ = flatten_multipart(multipart).await;
        }
    }

    #[tokio::test]
    async fn test_multipart_body_binds() {
        let body = "--XyZ\r\n\
                    Content-Disposition: form-data; name=\"title\"\r\n\r\n\
                    From multipart\r\n\
                    --XyZ\r\n\
                    Content-Disposition: form-data; name=\"expires\"\r\n\r\n\
                    365\r\n\
                    --XyZ--\r\n";
        let form = bind(post("multipart/form-data; boundary=XyZ", body))
            .await
            .unwrap();
        assert_eq!(form.title, "From multipart");
        assert_eq!(form.expires, 365);
    }
}
