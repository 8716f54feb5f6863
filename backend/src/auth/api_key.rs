use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::logging::client_addr;
use crate::AppState;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing API key header")]
    MissingHeader,
    #[error("Invalid API key")]
    InvalidKey,
    #[error("API key must not be empty")]
    EmptyKey,
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),
}

/// Checks the shared secret carried in a request header.
///
/// Only the SHA-256 digest of the configured key is kept. Presented keys are
/// hashed and compared digest-to-digest without early exit, so response
/// timing depends on neither the key length nor the position of the first
/// mismatching byte.
pub struct ApiKeyGuard {
    header: HeaderName,
    digest: [u8; 32],
}

impl ApiKeyGuard {
    pub fn new(header: &str, api_key: &str) -> Result<Self, AuthError> {
        if api_key.is_empty() {
            return Err(AuthError::EmptyKey);
        }
        let header = HeaderName::try_from(header)
            .map_err(|_| AuthError::InvalidHeaderName(header.to_string()))?;

        Ok(Self {
            header,
            digest: digest(api_key.as_bytes()),
        })
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Authorize a request by its headers.
    pub fn verify(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let presented = headers
            .get(&self.header)
            .ok_or(AuthError::MissingHeader)?
            .as_bytes();

        if presented.is_empty() {
            return Err(AuthError::InvalidKey);
        }

        if constant_time_eq(&digest(presented), &self.digest) {
            Ok(())
        } else {
            Err(AuthError::InvalidKey)
        }
    }
}

fn digest(value: &[u8]) -> [u8; 32] {
    Sha256::digest(value).into()
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware rejecting requests without the configured API key.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = state.api_key_guard.verify(request.headers()) {
        let addr = client_addr(&request);
        state
            .request_log
            .warning(&format!("Unauthorized access attempt from {}", addr));
        tracing::warn!(client = %addr, reason = %e, "Rejected request");
        return ApiError::Unauthorized.into_response();
    }

    next.run(request).await
}
