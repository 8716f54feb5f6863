//! Tree-ensemble classifier loaded from a JSON artifact.
//!
//! The artifact describes a random-forest style model: every tree votes with
//! the class distribution of the leaf a sample lands in, the forest averages
//! those distributions and predicts the most probable class.
//!
//! ```json
//! {
//!   "n_features": 4,
//!   "classes": [0, 1, 2],
//!   "trees": [
//!     { "nodes": [
//!       { "feature": 2, "threshold": 2.45, "left": 1, "right": 2 },
//!       { "value": [50, 0, 0] },
//!       { "value": [0, 50, 50] }
//!     ] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{validate_sample, Classifier, ModelError, PredictError};

/// A node of a decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Internal node: samples with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal node holding per-class weights.
    Leaf { value: Vec<f64> },
}

/// A single decision tree stored as a flat node array rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root to the leaf this sample falls into.
    fn leaf_for(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { value } => return value,
            }
        }
    }
}

/// Random-forest style classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub n_features: usize,
    pub classes: Vec<i64>,
    pub trees: Vec<Tree>,
}

impl ForestClassifier {
    /// Load and validate an artifact from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate an artifact from its JSON text.
    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let mut forest: ForestClassifier = serde_json::from_str(raw)?;
        forest.validate()?;
        forest.normalize_leaves();
        Ok(forest)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.n_features == 0 {
            return Err(ModelError::Invalid("n_features must be positive".to_string()));
        }
        if self.classes.is_empty() {
            return Err(ModelError::Invalid("no classes defined".to_string()));
        }
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("no trees defined".to_string()));
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ModelError::Invalid(format!("tree {} has no nodes", t)));
            }

            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= self.n_features {
                            return Err(ModelError::Invalid(format!(
                                "tree {} node {}: feature {} out of range (n_features = {})",
                                t, i, feature, self.n_features
                            )));
                        }
                        if !threshold.is_finite() {
                            return Err(ModelError::Invalid(format!(
                                "tree {} node {}: threshold is not finite",
                                t, i
                            )));
                        }
                        // Children must point forward so every walk terminates.
                        for child in [*left, *right] {
                            if child <= i || child >= tree.nodes.len() {
                                return Err(ModelError::Invalid(format!(
                                    "tree {} node {}: invalid child index {}",
                                    t, i, child
                                )));
                            }
                        }
                    }
                    Node::Leaf { value } => {
                        if value.len() != self.classes.len() {
                            return Err(ModelError::Invalid(format!(
                                "tree {} node {}: leaf has {} weights, expected {}",
                                t,
                                i,
                                value.len(),
                                self.classes.len()
                            )));
                        }
                        if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                            return Err(ModelError::Invalid(format!(
                                "tree {} node {}: leaf weights must be finite and non-negative",
                                t, i
                            )));
                        }
                        if value.iter().sum::<f64>() <= 0.0 {
                            return Err(ModelError::Invalid(format!(
                                "tree {} node {}: leaf weights sum to zero",
                                t, i
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn normalize_leaves(&mut self) {
        for tree in &mut self.trees {
            for node in &mut tree.nodes {
                if let Node::Leaf { value } = node {
                    let total: f64 = value.iter().sum();
                    value.iter_mut().for_each(|w| *w /= total);
                }
            }
        }
    }

    /// Mean class distribution over all trees for one sample.
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictError> {
        validate_sample(features, self.n_features)?;

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.leaf_for(features)) {
                *acc += p;
            }
        }

        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }
}

impl Classifier for ForestClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<i64, PredictError> {
        let proba = self.predict_proba(features)?;

        // First maximum wins ties.
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }

        Ok(self.classes[best])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STUMP: &str = r#"{
        "n_features": 2,
        "classes": [7, 9],
        "trees": [
            { "nodes": [
                { "feature": 0, "threshold": 0.5, "left": 1, "right": 2 },
                { "value": [3, 1] },
                { "value": [0, 2] }
            ] }
        ]
    }"#;

    const IRIS: &str = r#"{
        "n_features": 4,
        "classes": [0, 1, 2],
        "trees": [
            { "nodes": [
                { "feature": 2, "threshold": 2.45, "left": 1, "right": 2 },
                { "value": [50, 0, 0] },
                { "feature": 3, "threshold": 1.75, "left": 3, "right": 4 },
                { "value": [0, 49, 5] },
                { "value": [0, 1, 45] }
            ] },
            { "nodes": [
                { "feature": 3, "threshold": 0.8, "left": 1, "right": 2 },
                { "value": [50, 0, 0] },
                { "feature": 2, "threshold": 4.95, "left": 3, "right": 4 },
                { "value": [0, 47, 1] },
                { "value": [0, 3, 49] }
            ] }
        ]
    }"#;

    #[test]
    fn test_stump_goes_left_on_equal_threshold() {
        let forest = ForestClassifier::from_json(STUMP).unwrap();
        assert_eq!(forest.predict(&[0.5, 0.0]).unwrap(), 7);
        assert_eq!(forest.predict(&[0.6, 0.0]).unwrap(), 9);
    }

    #[test]
    fn test_leaf_weights_are_normalized() {
        let forest = ForestClassifier::from_json(STUMP).unwrap();
        let proba = forest.predict_proba(&[0.0, 0.0]).unwrap();
        assert_eq!(proba, vec![0.75, 0.25]);
    }

    #[test]
    fn test_iris_classes() {
        let forest = ForestClassifier::from_json(IRIS).unwrap();
        assert_eq!(forest.predict(&[5.1, 3.5, 1.4, 0.2]).unwrap(), 0);
        assert_eq!(forest.predict(&[5.9, 3.0, 4.2, 1.5]).unwrap(), 1);
        assert_eq!(forest.predict(&[6.7, 3.0, 5.2, 2.3]).unwrap(), 2);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let forest = ForestClassifier::from_json(IRIS).unwrap();
        let sample = [6.0, 2.9, 4.5, 1.5];
        let first = forest.predict(&sample).unwrap();
        for _ in 0..10 {
            assert_eq!(forest.predict(&sample).unwrap(), first);
        }
    }

    #[test]
    fn test_tie_picks_first_class() {
        let raw = r#"{
            "n_features": 1,
            "classes": [4, 5],
            "trees": [ { "nodes": [ { "value": [1, 1] } ] } ]
        }"#;
        let forest = ForestClassifier::from_json(raw).unwrap();
        assert_eq!(forest.predict(&[0.0]).unwrap(), 4);
    }

    #[test]
    fn test_wrong_feature_count() {
        let forest = ForestClassifier::from_json(IRIS).unwrap();
        let err = forest.predict(&[5.1, 3.5, 1.4]).unwrap_err();
        assert_eq!(err, PredictError::FeatureCountMismatch { expected: 4, got: 3 });
    }

    #[test]
    fn test_rejects_feature_out_of_range() {
        let raw = STUMP.replace(r#""feature": 0"#, r#""feature": 2"#);
        let err = ForestClassifier::from_json(&raw).unwrap_err();
        assert!(err.to_string().contains("feature 2 out of range"));
    }

    #[test]
    fn test_rejects_backward_child() {
        let raw = STUMP.replace(r#""left": 1"#, r#""left": 0"#);
        let err = ForestClassifier::from_json(&raw).unwrap_err();
        assert!(err.to_string().contains("invalid child index 0"));
    }

    #[test]
    fn test_rejects_leaf_width_mismatch() {
        let raw = STUMP.replace("[3, 1]", "[3, 1, 0]");
        let err = ForestClassifier::from_json(&raw).unwrap_err();
        assert!(err.to_string().contains("leaf has 3 weights, expected 2"));
    }

    #[test]
    fn test_rejects_zero_leaf() {
        let raw = STUMP.replace("[0, 2]", "[0, 0]");
        assert!(matches!(
            ForestClassifier::from_json(&raw),
            Err(ModelError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_empty_forest() {
        let raw = r#"{ "n_features": 4, "classes": [0], "trees": [] }"#;
        let err = ForestClassifier::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("no trees defined"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            ForestClassifier::from_json("{ not json"),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(IRIS.as_bytes()).unwrap();

        let forest = ForestClassifier::from_path(file.path()).unwrap();
        assert_eq!(forest.n_features(), 4);
        assert_eq!(forest.trees.len(), 2);
    }

    #[test]
    fn test_from_missing_path() {
        let err = ForestClassifier::from_path("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }
}
