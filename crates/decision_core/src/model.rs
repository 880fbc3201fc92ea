//! Scoring model adapter.
//!
//! Models are trained elsewhere and shipped as JSON artifacts. An artifact is
//! loaded once per process, never mutated, and shared read-only behind an
//! `Arc`. Callers only see two capabilities:
//!
//! - [`Classifier`]: class probabilities; the match flow reads class 1.
//! - [`Regressor`]: a scalar estimate; the pricing flow reads it as a fare.
//!
//! Supported artifact kinds:
//!
//! ```json
//! {"kind": "linear_regression", "intercept": 12.0, "coefficients": [1.5, 0.4, 0.0, 0.0, 0.1, 3.0]}
//! {"kind": "logistic_regression", "intercept": -1.0, "coefficients": [...]}
//! {"kind": "tree_ensemble", "task": "classification", "trees": [{"nodes": [...]}]}
//! ```
//!
//! Tree nodes are either splits (`feature`, `threshold`, `left`, `right`,
//! going left when `x[feature] <= threshold`) or leaves (`value`). Children
//! must come after their parent. Ensembles average their trees.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model artifact: {0}")]
    Invalid(String),

    #[error("model was trained on features {found:?}, expected {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("expected a {expected} model, artifact is a {found} model")]
    WrongTask {
        expected: ModelTask,
        found: ModelTask,
    },

    #[error("classifier produced {0} class probabilities, need at least 2")]
    MissingPositiveClass(usize),

    #[error("model produced a non-finite output: {0}")]
    NonFinite(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTask {
    Classification,
    Regression,
}

impl fmt::Display for ModelTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classification => f.write_str("classification"),
            Self::Regression => f.write_str("regression"),
        }
    }
}

pub trait Classifier: Send + Sync + fmt::Debug {
    /// Probability per class, indexed by class label.
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError>;

    /// Probability of class 1 for a binary classifier.
    fn positive_probability(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let probabilities = self.predict_proba(features)?;
        let probability = *probabilities
            .get(1)
            .ok_or(ModelError::MissingPositiveClass(probabilities.len()))?;
        if !probability.is_finite() {
            return Err(ModelError::NonFinite(probability));
        }
        if !(0.0..=1.0).contains(&probability) {
            tracing::warn!(probability, "positive class probability outside [0, 1]");
        }
        Ok(probability)
    }
}

pub trait Regressor: Send + Sync + fmt::Debug {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

/// Weights over the feature schema plus an intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: [f64; FEATURE_COUNT],
}

impl LinearModel {
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        self.coefficients
            .iter()
            .zip(features.as_slice())
            .fold(self.intercept, |acc, (weight, value)| acc + weight * value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression(pub LinearModel);

impl Regressor for LinearRegression {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(self.0.decision_function(features))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression(pub LinearModel);

impl Classifier for LogisticRegression {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        let z = self.0.decision_function(features);
        let positive = 1.0 / (1.0 + (-z).exp());
        Ok(vec![1.0 - positive, positive])
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(Vec<f64>),
}

/// A single decision tree in flat node order (root at index 0).
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn leaf(&self, features: &FeatureVector) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf(value) => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = features.as_slice()[*feature];
                    index = if x <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Averaged decision trees, random-forest style.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    task: ModelTask,
    outputs: usize,
    trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    pub fn task(&self) -> ModelTask {
        self.task
    }

    fn average(&self, features: &FeatureVector) -> Vec<f64> {
        let mut sums = vec![0.0; self.outputs];
        for tree in &self.trees {
            for (sum, value) in sums.iter_mut().zip(tree.leaf(features)) {
                *sum += value;
            }
        }
        let count = self.trees.len() as f64;
        sums.iter_mut().for_each(|sum| *sum /= count);
        sums
    }
}

impl Classifier for TreeEnsemble {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        Ok(self.average(features))
    }
}

impl Regressor for TreeEnsemble {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(self.average(features)[0])
    }
}

// ---------------------------------------------------------------------------
// Artifact (on-disk) representation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Column names the model was trained on, if the exporter recorded them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    #[serde(flatten)]
    pub spec: ModelSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    LinearRegression(LinearSpec),
    LogisticRegression(LinearSpec),
    TreeEnsemble(TreeEnsembleSpec),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSpec {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsembleSpec {
    pub task: ModelTask,
    pub trees: Vec<TreeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

impl ModelArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Self = serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        artifact.check_schema()?;
        tracing::info!(path = %path.display(), task = %artifact.task(), "loaded model artifact");
        Ok(artifact)
    }

    pub fn task(&self) -> ModelTask {
        match &self.spec {
            ModelSpec::LinearRegression(_) => ModelTask::Regression,
            ModelSpec::LogisticRegression(_) => ModelTask::Classification,
            ModelSpec::TreeEnsemble(spec) => spec.task,
        }
    }

    fn check_schema(&self) -> Result<(), ModelError> {
        let Some(found) = &self.feature_names else {
            return Ok(());
        };
        if found.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
            return Err(ModelError::SchemaMismatch {
                expected: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
                found: found.clone(),
            });
        }
        Ok(())
    }

    fn expect_task(&self, expected: ModelTask) -> Result<(), ModelError> {
        let found = self.task();
        if found != expected {
            return Err(ModelError::WrongTask { expected, found });
        }
        Ok(())
    }

    pub fn into_classifier(self) -> Result<Arc<dyn Classifier>, ModelError> {
        self.check_schema()?;
        self.expect_task(ModelTask::Classification)?;
        match self.spec {
            ModelSpec::LogisticRegression(spec) => Ok(Arc::new(LogisticRegression(spec.build()?))),
            ModelSpec::TreeEnsemble(spec) => Ok(Arc::new(spec.build()?)),
            ModelSpec::LinearRegression(_) => Err(ModelError::WrongTask {
                expected: ModelTask::Classification,
                found: ModelTask::Regression,
            }),
        }
    }

    pub fn into_regressor(self) -> Result<Arc<dyn Regressor>, ModelError> {
        self.check_schema()?;
        self.expect_task(ModelTask::Regression)?;
        match self.spec {
            ModelSpec::LinearRegression(spec) => Ok(Arc::new(LinearRegression(spec.build()?))),
            ModelSpec::TreeEnsemble(spec) => Ok(Arc::new(spec.build()?)),
            ModelSpec::LogisticRegression(_) => Err(ModelError::WrongTask {
                expected: ModelTask::Regression,
                found: ModelTask::Classification,
            }),
        }
    }
}

impl LinearSpec {
    fn build(self) -> Result<LinearModel, ModelError> {
        let coefficients: [f64; FEATURE_COUNT] =
            self.coefficients.as_slice().try_into().map_err(|_| {
                ModelError::Invalid(format!(
                    "expected {FEATURE_COUNT} coefficients, found {}",
                    self.coefficients.len()
                ))
            })?;
        Ok(LinearModel {
            intercept: self.intercept,
            coefficients,
        })
    }
}

impl TreeEnsembleSpec {
    fn build(self) -> Result<TreeEnsemble, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("tree ensemble has no trees".to_string()));
        }

        let mut outputs = None;
        let mut trees = Vec::with_capacity(self.trees.len());
        for (tree_index, tree) in self.trees.into_iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ModelError::Invalid(format!("tree {tree_index} has no nodes")));
            }
            let node_count = tree.nodes.len();
            let mut nodes = Vec::with_capacity(node_count);
            for (node_index, node) in tree.nodes.into_iter().enumerate() {
                let invalid = |reason: String| {
                    ModelError::Invalid(format!("tree {tree_index} node {node_index}: {reason}"))
                };
                match node {
                    NodeSpec::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if feature >= FEATURE_COUNT {
                            return Err(invalid(format!("feature index {feature} out of range")));
                        }
                        for child in [left, right] {
                            if child <= node_index || child >= node_count {
                                return Err(invalid(format!("child index {child} out of order")));
                            }
                        }
                        nodes.push(TreeNode::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        });
                    }
                    NodeSpec::Leaf { value } => {
                        let expected = *outputs.get_or_insert(value.len());
                        if value.len() != expected || expected == 0 {
                            return Err(invalid(format!(
                                "leaf has {} outputs, expected {expected}",
                                value.len()
                            )));
                        }
                        nodes.push(TreeNode::Leaf(value));
                    }
                }
            }
            trees.push(DecisionTree { nodes });
        }

        let outputs = outputs.unwrap_or(0);
        match self.task {
            ModelTask::Regression if outputs != 1 => Err(ModelError::Invalid(format!(
                "regression leaves must hold 1 value, found {outputs}"
            ))),
            ModelTask::Classification if outputs < 2 => Err(ModelError::Invalid(format!(
                "classification leaves must hold at least 2 class probabilities, found {outputs}"
            ))),
            _ => Ok(TreeEnsemble {
                task: self.task,
                outputs,
                trees,
            }),
        }
    }
}

pub fn load_classifier(path: impl AsRef<Path>) -> Result<Arc<dyn Classifier>, ModelError> {
    ModelArtifact::load(path)?.into_classifier()
}

pub fn load_regressor(path: impl AsRef<Path>) -> Result<Arc<dyn Regressor>, ModelError> {
    ModelArtifact::load(path)?.into_regressor()
}
