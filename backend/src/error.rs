//! Error types for the prediction API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use simple_predict_common::ErrorResponse;

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid input format")]
    InvalidInput,

    #[error("unauthorized")]
    Unauthorized,

    /// Feature coercion or model failure. The message is sent as-is.
    #[error("{0}")]
    Inference(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.to_string()));
        (self.status(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InvalidInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Inference("boom".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::InvalidInput.to_string(), "Invalid input format");
        assert_eq!(ApiError::Unauthorized.to_string(), "unauthorized");
        assert_eq!(ApiError::Inference("boom".to_string()).to_string(), "boom");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
