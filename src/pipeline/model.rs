//! Regression models evaluated from a numeric description
//!
//! Models are plain parameter sets (coefficients, tree node arrays) so that
//! any training environment can export them without sharing a runtime.

use crate::error::{PricingError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Regression tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        #[serde(default)]
        n_samples: usize,
        #[serde(default)]
        impurity: f64,
    },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

impl TreeNode {
    fn n_samples(&self) -> usize {
        match self {
            TreeNode::Leaf { n_samples, .. } | TreeNode::Split { n_samples, .. } => *n_samples,
        }
    }

    fn impurity(&self) -> f64 {
        match self {
            TreeNode::Leaf { impurity, .. } | TreeNode::Split { impurity, .. } => *impurity,
        }
    }

    fn predict(&self, x: &Array1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if x[*feature_idx] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    fn max_feature_idx(&self) -> Option<usize> {
        match self {
            TreeNode::Leaf { .. } => None,
            TreeNode::Split { feature_idx, left, right, .. } => [
                Some(*feature_idx),
                left.max_feature_idx(),
                right.max_feature_idx(),
            ]
            .into_iter()
            .flatten()
            .max(),
        }
    }

    fn has_invalid_threshold(&self) -> bool {
        match self {
            TreeNode::Leaf { value, .. } => !value.is_finite(),
            TreeNode::Split { threshold, left, right, .. } => {
                threshold.is_nan() || left.has_invalid_threshold() || right.has_invalid_threshold()
            }
        }
    }

    /// Accumulate weighted impurity decrease per feature
    fn accumulate_importance(&self, importances: &mut [f64]) {
        if let TreeNode::Split { feature_idx, left, right, n_samples, impurity, .. } = self {
            let decrease = *n_samples as f64 * impurity
                - left.n_samples() as f64 * left.impurity()
                - right.n_samples() as f64 * right.impurity();
            importances[*feature_idx] += decrease.max(0.0);
            left.accumulate_importance(importances);
            right.accumulate_importance(importances);
        }
    }
}

/// How tree outputs are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random-forest style average
    Mean,
    /// Boosting style sum, scaled by the learning rate
    Sum,
}

fn default_learning_rate() -> f64 {
    1.0
}

/// Linear regression parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// Forest or boosted ensemble of regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    pub trees: Vec<TreeNode>,
    pub aggregation: Aggregation,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub base_score: f64,
    /// Importances exported by the trainer; computed from the trees when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importances: Option<Vec<f64>>,
}

impl TreeEnsemble {
    fn predict(&self, x: &Array1<f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        match self.aggregation {
            Aggregation::Mean if !self.trees.is_empty() => {
                self.base_score + total / self.trees.len() as f64
            }
            Aggregation::Mean => self.base_score,
            Aggregation::Sum => self.base_score + self.learning_rate * total,
        }
    }

    /// Mean of per-tree normalized impurity decrease, normalized to sum 1
    fn computed_importances(&self) -> Array1<f64> {
        let mut total = vec![0.0; self.n_features];

        for tree in &self.trees {
            let mut importances = vec![0.0; self.n_features];
            tree.accumulate_importance(&mut importances);
            let sum: f64 = importances.iter().sum();
            if sum > 0.0 {
                for (t, imp) in total.iter_mut().zip(&importances) {
                    *t += imp / sum;
                }
            }
        }

        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for imp in &mut total {
                *imp /= sum;
            }
        }

        Array1::from_vec(total)
    }
}

/// A trained regression model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegressionModel {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl RegressionModel {
    /// Expected input width
    pub fn n_features(&self) -> usize {
        match self {
            RegressionModel::Linear(m) => m.coefficients.len(),
            RegressionModel::TreeEnsemble(m) => m.n_features,
        }
    }

    /// Predict a single transformed feature vector
    pub fn predict(&self, x: &Array1<f64>) -> Result<f64> {
        if x.len() != self.n_features() {
            return Err(PricingError::InferenceError(format!(
                "feature length mismatch: got {}, model expects {}",
                x.len(),
                self.n_features()
            )));
        }

        let y = match self {
            RegressionModel::Linear(m) => {
                m.intercept + x.iter().zip(&m.coefficients).map(|(a, b)| a * b).sum::<f64>()
            }
            RegressionModel::TreeEnsemble(m) => m.predict(x),
        };

        Ok(y)
    }

    /// Per-feature importance as reported by the model.
    ///
    /// Linear models report absolute coefficients.
    pub fn feature_importances(&self) -> Array1<f64> {
        match self {
            RegressionModel::Linear(m) => m.coefficients.iter().map(|c| c.abs()).collect(),
            RegressionModel::TreeEnsemble(m) => match &m.feature_importances {
                Some(stored) => Array1::from_vec(stored.clone()),
                None => m.computed_importances(),
            },
        }
    }

    /// Structural checks run when an artifact is loaded
    pub fn validate(&self) -> Result<()> {
        match self {
            RegressionModel::Linear(m) => {
                if !m.intercept.is_finite() || m.coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(PricingError::ArtifactError(
                        "linear model has non-finite parameters".to_string(),
                    ));
                }
            }
            RegressionModel::TreeEnsemble(m) => {
                if m.trees.is_empty() {
                    return Err(PricingError::ArtifactError("tree ensemble has no trees".to_string()));
                }
                for (i, tree) in m.trees.iter().enumerate() {
                    if let Some(idx) = tree.max_feature_idx() {
                        if idx >= m.n_features {
                            return Err(PricingError::ArtifactError(format!(
                                "tree {} splits on feature {} but model has {} features",
                                i, idx, m.n_features
                            )));
                        }
                    }
                    if tree.has_invalid_threshold() {
                        return Err(PricingError::ArtifactError(format!(
                            "tree {} has a NaN threshold or non-finite leaf",
                            i
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
