//! Panic recovery.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use futures::FutureExt;

use super::Interceptor;
use super::headers::apply_security_headers;
use crate::routes::helpers::server_error;

/// Outermost stage: turns a panic anywhere inside into a 500.
///
/// The response carries the security headers, since the stage that normally
/// adds them was unwound, and `Connection: close` so the connection that
/// observed the panic is not reused.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecoverPanic;

#[async_trait]
impl Interceptor for RecoverPanic {
    fn name(&self) -> &'static str {
        "recover_panic"
    }

    async fn intercept(&self, request: Request, next: Next) -> Response {
        let method = request.method().clone();
        let uri = request.uri().clone();

        match AssertUnwindSafe(next.run(request)).catch_unwind().await {
            Ok(response) => response,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                let mut response = server_error(anyhow::anyhow!(
                    "panic while handling {method} {uri}: {message}"
                ));
                let headers = response.headers_mut();
                apply_security_headers(headers);
                headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
                response
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
