//! Ranked feature importance reports

use crate::error::{PricingError, Result};
use crate::pipeline::PricePipeline;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// One feature and its importance weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportanceEntry {
    pub name: String,
    pub weight: f64,
}

/// Importances sorted descending and split into two views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedImportanceReport {
    /// Top-K one-hot columns of the identity fields (brand, model)
    pub categorical_top_k: Vec<FeatureImportanceEntry>,
    /// Every other feature, unfiltered
    pub core_features: Vec<FeatureImportanceEntry>,
    /// All features, ranked
    #[serde(skip)]
    pub ranked: Vec<FeatureImportanceEntry>,
}

impl RankedImportanceReport {
    /// Sum of all weights; model specific, not necessarily 1.0
    pub fn total_weight(&self) -> f64 {
        self.ranked.iter().map(|e| e.weight).sum()
    }
}

/// How features are grouped in a report
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainOptions {
    /// Exact one-hot column names (`<field>_<level>`) of the identity fields
    pub identity_columns: HashSet<String>,
    pub top_k: usize,
}

/// Extract importances from a pipeline and rank them against `feature_names`
pub fn explain(
    pipeline: &dyn PricePipeline,
    feature_names: &[String],
    options: &ExplainOptions,
) -> Result<RankedImportanceReport> {
    let importances = pipeline.feature_importances().ok_or_else(|| {
        PricingError::InferenceError("model does not report feature importances".to_string())
    })?;
    rank_importances(&importances.to_vec(), feature_names, options)
}

/// Pair importances with names, sort descending and partition.
///
/// Ties keep the order of `feature_names`.
pub fn rank_importances(
    importances: &[f64],
    feature_names: &[String],
    options: &ExplainOptions,
) -> Result<RankedImportanceReport> {
    if importances.len() != feature_names.len() {
        return Err(PricingError::SchemaMismatch {
            expected: feature_names.len(),
            actual: importances.len(),
        });
    }

    if let Some((name, weight)) = feature_names
        .iter()
        .zip(importances)
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(PricingError::InferenceError(format!(
            "invalid importance {} for feature '{}'",
            weight, name
        )));
    }

    let mut ranked: Vec<FeatureImportanceEntry> = feature_names
        .iter()
        .zip(importances)
        .map(|(name, &weight)| FeatureImportanceEntry { name: name.clone(), weight })
        .collect();
    // -0.0 and 0.0 compare equal here, so they keep insertion order
    ranked.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));

    let (identity, core): (Vec<_>, Vec<_>) = ranked
        .iter()
        .cloned()
        .partition(|e| options.identity_columns.contains(&e.name));

    Ok(RankedImportanceReport {
        categorical_top_k: identity.into_iter().take(options.top_k).collect(),
        core_features: core,
        ranked,
    })
}
