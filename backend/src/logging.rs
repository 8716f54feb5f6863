use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppState;

/// Peer address of the connection, or `"unknown"` when the server was not
/// started with connect info (e.g. in-process tests).
pub fn client_addr(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware that records every inbound request before it is handled.
pub async fn request_logger(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let addr = client_addr(&request);

    state
        .request_log
        .info(&format!("Request from {}: {} {}", addr, method, path));

    let response = next.run(request).await;

    tracing::info!(
        client = %addr,
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "HTTP request"
    );

    response
}
