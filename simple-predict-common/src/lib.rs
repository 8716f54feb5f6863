//! SimplePredict Common Types
//!
//! The classifier abstraction, the tree-ensemble artifact it is loaded from,
//! and the JSON bodies exchanged with clients.

pub mod forest;
pub mod model;
pub mod protocol;

pub use forest::{ForestClassifier, Node, Tree};
pub use model::{validate_sample, Classifier, ModelError, PredictError};
pub use protocol::{ErrorResponse, PredictionResponse};
