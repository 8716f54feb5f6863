use std::path::Path;
use std::sync::Arc;

use simple_predict_common::{Classifier, ForestClassifier, PredictError};

use crate::audit::RequestLog;
use crate::config::Config;
use crate::AppState;

pub const TEST_API_KEY: &str = "supersecretkey123";

/// The iris artifact shipped at the workspace root.
pub const IRIS_MODEL_JSON: &str = include_str!("../../../model.json");

pub fn test_config(log_file: &Path) -> Config {
    let raw = format!(
        "[auth]\napi_key = \"{}\"\n\n[logging]\nlevel = \"debug\"\nfile = \"{}\"\n",
        TEST_API_KEY,
        log_file.display()
    );
    Config::from_toml(&raw).expect("test config must be valid")
}

pub fn iris_model() -> ForestClassifier {
    ForestClassifier::from_json(IRIS_MODEL_JSON).expect("shipped model must be valid")
}

pub fn create_test_state_with_model(log_file: &Path, model: Arc<dyn Classifier>) -> Arc<AppState> {
    let config = test_config(log_file);
    let request_log = RequestLog::open(log_file).expect("Failed to open test log");
    Arc::new(AppState::new(config, model, request_log).expect("Failed to build test state"))
}

pub fn create_test_state(log_file: &Path) -> Arc<AppState> {
    create_test_state_with_model(log_file, Arc::new(iris_model()))
}

/// Classifier that always answers with the same label.
pub struct FixedClassifier {
    pub n_features: usize,
    pub label: i64,
}

impl Classifier for FixedClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<i64, PredictError> {
        simple_predict_common::validate_sample(features, self.n_features)?;
        Ok(self.label)
    }
}
