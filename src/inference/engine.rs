//! Inference engine implementation
//!
//! Runs a validated record through a shared pipeline:
//! - Failures and panics inside the pipeline become `InferenceError`
//! - Prices are rounded to whole currency units and never negative
//! - Importance reports are computed once per loaded artifact

use super::explain::{explain, ExplainOptions, RankedImportanceReport};
use super::InferenceConfig;
use crate::error::{PricingError, Result};
use crate::normalizer::CarFeatureRecord;
use crate::pipeline::{LoadedPipeline, PricePipeline};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, warn};

/// Estimated price for one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEstimate {
    /// Rounded to the nearest whole unit
    pub amount: u64,
    /// Model output before rounding and clamping
    pub raw: f64,
    pub currency: String,
}

/// Prediction and explanation over one loaded pipeline
pub struct InferenceEngine {
    config: InferenceConfig,
    pipeline: Arc<dyn PricePipeline>,
    feature_names: Arc<[String]>,
    identity_columns: HashSet<String>,
    currency: String,
    report: OnceLock<RankedImportanceReport>,
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("config", &self.config)
            .field("n_features", &self.feature_names.len())
            .field("identity_columns", &self.identity_columns.len())
            .field("report_cached", &self.report.get().is_some())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl InferenceEngine {
    /// Create an engine over any pipeline implementation.
    ///
    /// `identity_columns` are the exact feature names reported in the
    /// brand/model view.
    pub fn new(
        config: InferenceConfig,
        pipeline: Arc<dyn PricePipeline>,
        feature_names: Arc<[String]>,
        identity_columns: impl IntoIterator<Item = String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            config,
            pipeline,
            feature_names,
            identity_columns: identity_columns.into_iter().collect(),
            currency: currency.into(),
            report: OnceLock::new(),
        }
    }

    /// Create an engine over a loaded artifact, taking grouping and currency from its schema
    pub fn from_pipeline(config: InferenceConfig, pipeline: Arc<LoadedPipeline>) -> Self {
        let feature_names = Arc::clone(pipeline.feature_names());
        let identity_columns = pipeline
            .encoder()
            .one_hot_names(&pipeline.schema().identity_fields);
        let currency = pipeline.schema().currency.clone();
        Self::new(config, pipeline, feature_names, identity_columns, currency)
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Predict the price of a validated record
    pub fn predict(&self, record: &CarFeatureRecord) -> Result<PriceEstimate> {
        let start = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.pipeline.predict(record)));
        let raw = match outcome {
            Ok(result) => result?,
            Err(payload) => {
                return Err(PricingError::InferenceError(format!(
                    "pipeline panicked: {}",
                    panic_message(payload.as_ref())
                )))
            }
        };

        if !raw.is_finite() {
            return Err(PricingError::InferenceError(format!(
                "model produced a non-finite price: {}",
                raw
            )));
        }

        let price = if raw < 0.0 {
            if !self.config.clamp_negative_prices {
                return Err(PricingError::InferenceError(format!(
                    "model produced a negative price: {:.2}",
                    raw
                )));
            }
            warn!(raw_price = raw, "Model produced a negative price, clamping to zero");
            0.0
        } else {
            raw
        };

        let estimate = PriceEstimate {
            amount: price.round() as u64,
            raw,
            currency: self.currency.clone(),
        };

        debug!(
            amount = estimate.amount,
            latency_us = start.elapsed().as_micros() as u64,
            "Prediction complete"
        );

        Ok(estimate)
    }

    /// Ranked importance report for the loaded model.
    ///
    /// The first successful report is cached; the model is immutable so
    /// every later call returns the same lists.
    pub fn explain(&self) -> Result<RankedImportanceReport> {
        if let Some(report) = self.report.get() {
            return Ok(report.clone());
        }

        let options = ExplainOptions {
            identity_columns: self.identity_columns.clone(),
            top_k: self.config.top_k,
        };
        let report = explain(self.pipeline.as_ref(), &self.feature_names, &options)?;

        if self.config.cache_importances {
            let _ = self.report.set(report.clone());
        }
        Ok(report)
    }
}
