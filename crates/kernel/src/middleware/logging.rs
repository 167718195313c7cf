//! Access logging.

use std::net::SocketAddr;
use std::time::Instant;

use async_trait::async_trait;
use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, info};

use super::Interceptor;

/// Logs every request on the way in, before anything can reject it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRequest;

#[async_trait]
impl Interceptor for LogRequest {
    fn name(&self) -> &'static str {
        "log_request"
    }

    async fn intercept(&self, request: Request, next: Next) -> Response {
        let ip = client_addr(&request);
        let method = request.method().clone();
        let uri = request.uri().clone();

        info!(
            %ip,
            proto = ?request.version(),
            %method,
            %uri,
            "received request"
        );

        let started = Instant::now();
        let response = next.run(request).await;

        debug!(
            %method,
            %uri,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "finished request"
        );

        response
    }
}

/// Peer address recorded by the server, or `-` when unknown.
fn client_addr(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "-".to_string(), |ConnectInfo(addr)| addr.to_string())
}
