//! End-to-end tests against a real listener.

use std::net::SocketAddr;

use reqwest::StatusCode;
use serde_json::{json, Value};
use simple_predict_backend::app;
use simple_predict_backend::test_util::{create_test_state, TEST_API_KEY};
use tokio::net::TcpListener;

async fn spawn_server(log_file: &std::path::Path) -> SocketAddr {
    let state = create_test_state(log_file);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app(state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    addr
}

#[tokio::test]
async fn test_predict_ok() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("app.log");
    let addr = spawn_server(&log_file).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/predict", addr))
        .header("x-api-key", TEST_API_KEY)
        .json(&json!({"features": [5.1, 3.5, 1.4, 0.2]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"prediction": 0}));

    let log = std::fs::read_to_string(&log_file).unwrap();
    assert!(log.contains("INFO - Request from 127.0.0.1: POST /predict"));
}

#[tokio::test]
async fn test_predict_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("app.log");
    let addr = spawn_server(&log_file).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/predict", addr))
        .json(&json!({"features": [5.1, 3.5, 1.4, 0.2]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "unauthorized"}));

    let log = std::fs::read_to_string(&log_file).unwrap();
    assert!(log.contains("WARNING - Unauthorized access attempt from 127.0.0.1"));
}
