use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    middleware,
    routing::post,
    Json, Router,
};
use serde_json::Value;
use simple_predict_common::PredictionResponse;

use crate::auth::require_api_key;
use crate::error::{ApiError, Result};
use crate::AppState;

/// POST /predict - classify one feature vector.
///
/// The body is read as JSON whatever the declared content type. Missing,
/// oversized or undecodable input is a 400; anything that goes wrong turning
/// `features` into a sample or running the model is a 500.
async fn predict(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<PredictionResponse>> {
    let body = body.map_err(|e| {
        tracing::debug!("Failed to read request body: {}", e);
        ApiError::InvalidInput
    })?;

    let features = extract_features(&body)?;

    let row = coerce_row(features).map_err(|msg| inference_error(&state, msg))?;

    let prediction = state
        .model
        .predict(&row)
        .map_err(|e| inference_error(&state, e.to_string()))?;

    tracing::debug!(?row, prediction, "Prediction served");

    Ok(Json(PredictionResponse { prediction }))
}

/// Pull the `features` member out of a JSON object body.
fn extract_features(body: &[u8]) -> Result<Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut map)) => map.remove("features").ok_or(ApiError::InvalidInput),
        _ => Err(ApiError::InvalidInput),
    }
}

/// Turn `features` into a single sample row. A bare number is a one-column row.
fn coerce_row(features: Value) -> std::result::Result<Vec<f64>, String> {
    match features {
        Value::Number(n) => Ok(vec![number_to_f64(&n, 0)?]),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Number(n) => number_to_f64(n, i),
                other => Err(format!(
                    "could not convert features[{}] to float: {}",
                    i, other
                )),
            })
            .collect(),
        other => Err(format!(
            "features must be a number or an array of numbers, got {}",
            other
        )),
    }
}

fn number_to_f64(n: &serde_json::Number, index: usize) -> std::result::Result<f64, String> {
    n.as_f64()
        .ok_or_else(|| format!("could not convert features[{}] to float: {}", index, n))
}

fn inference_error(state: &AppState, message: String) -> ApiError {
    if state.config.api.expose_error_details {
        ApiError::Inference(message)
    } else {
        tracing::error!("Prediction failed: {}", message);
        ApiError::Inference("internal error".to_string())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}
