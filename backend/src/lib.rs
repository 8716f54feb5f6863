pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod test_util;

pub use audit::RequestLog;
pub use auth::{ApiKeyGuard, AuthError};
pub use config::Config;
pub use error::ApiError;

use std::sync::Arc;

use axum::{middleware, Router};
use simple_predict_common::Classifier;
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Loaded once at startup, read-only afterwards.
    pub model: Arc<dyn Classifier>,
    pub request_log: RequestLog,
    pub api_key_guard: ApiKeyGuard,
}

impl AppState {
    pub fn new(
        config: Config,
        model: Arc<dyn Classifier>,
        request_log: RequestLog,
    ) -> Result<Self, AuthError> {
        let api_key_guard = ApiKeyGuard::new(&config.auth.header, &config.auth.api_key)?;

        Ok(Self {
            config,
            model,
            request_log,
            api_key_guard,
        })
    }
}

/// Build the full application: request logging, then auth, then the handler.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::predict::router(state.clone()))
        .layer(middleware::from_fn_with_state(state, logging::request_logger))
        .layer(TraceLayer::new_for_http())
}
