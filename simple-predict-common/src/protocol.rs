//! JSON bodies returned by the prediction endpoint.

use serde::{Deserialize, Serialize};

/// Successful prediction: `{"prediction": <label>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: i64,
}

/// Failure body shared by every error status: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_response_shape() {
        let json = serde_json::to_string(&PredictionResponse { prediction: 2 }).unwrap();
        assert_eq!(json, r#"{"prediction":2}"#);
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_string(&ErrorResponse::new("unauthorized")).unwrap();
        assert_eq!(json, r#"{"error":"unauthorized"}"#);
    }
}
