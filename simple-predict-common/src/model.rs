//! Classifier abstraction used by the prediction endpoint.

/// Error raised while loading a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    Invalid(String),
}

/// Error raised by a single inference call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error("X has {got} features, but the classifier is expecting {expected} features as input")]
    FeatureCountMismatch { expected: usize, got: usize },

    #[error("Input contains NaN or infinity at feature index {index}")]
    NonFiniteFeature { index: usize },
}

/// A pre-fitted classifier mapping one feature vector to a class label.
///
/// Implementations are immutable after construction and must be safe to
/// share between request handlers.
pub trait Classifier: Send + Sync {
    /// Number of features a sample must have.
    fn n_features(&self) -> usize;

    /// Predict the class label for a single sample.
    fn predict(&self, features: &[f64]) -> Result<i64, PredictError>;
}

/// Check a sample against the classifier's expected width and reject
/// non-finite values.
pub fn validate_sample(features: &[f64], expected: usize) -> Result<(), PredictError> {
    if features.len() != expected {
        return Err(PredictError::FeatureCountMismatch {
            expected,
            got: features.len(),
        });
    }

    if let Some(index) = features.iter().position(|v| !v.is_finite()) {
        return Err(PredictError::NonFiniteFeature { index });
    }

    Ok(())
}
