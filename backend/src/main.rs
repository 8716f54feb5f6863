//! SimplePredict - serves a pre-trained classifier on `POST /predict`.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use simple_predict_backend::{app, AppState, Config, RequestLog};
use simple_predict_common::{Classifier, ForestClassifier};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("simple-predict {}", VERSION);
        return Ok(());
    }

    // Load configuration
    let config = Config::load().map_err(|e| format!("Failed to load configuration: {}", e))?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SimplePredict {}", VERSION);

    // Load the model artifact
    let model = ForestClassifier::from_path(&config.model.model_path).map_err(|e| {
        format!(
            "Failed to load model from {}: {}",
            config.model.model_path, e
        )
    })?;
    tracing::info!(
        "Loaded model from {} ({} trees, {} features, {} classes)",
        config.model.model_path,
        model.trees.len(),
        model.n_features(),
        model.classes.len()
    );

    let request_log = RequestLog::open(&config.logging.file)
        .map_err(|e| format!("Failed to open request log {}: {}", config.logging.file, e))?;

    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config, Arc::new(model), request_log)?);

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
