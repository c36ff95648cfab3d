//! Request boundary of the pricing pipeline
//!
//! Every request ends in exactly one of two states, `Success` or `Failed`.
//! Errors are logged here and converted into a structured failure; nothing
//! past this point can take the host process down.

use crate::error::{ErrorKind, PricingError, Result};
use crate::inference::{FeatureImportanceEntry, InferenceConfig, InferenceEngine, RankedImportanceReport};
use crate::normalizer::{Normalizer, RawInput};
use crate::pipeline::{ArtifactLoader, LoadedPipeline};
use crate::schema::FeatureSchema;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Structured failure returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub error: String,
    pub kind: ErrorKind,
}

impl From<&PricingError> for Failure {
    fn from(err: &PricingError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}

/// Terminal state of one request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Success(T),
    Failed(Failure),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(v) => Some(v),
            Outcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failed(f) => Some(f),
        }
    }
}

/// Successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub price: u64,
    pub currency: String,
}

/// Successful explanation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportanceView {
    pub categorical_top_k: Vec<FeatureImportanceEntry>,
    pub core_features: Vec<FeatureImportanceEntry>,
}

impl From<RankedImportanceReport> for ImportanceView {
    fn from(report: RankedImportanceReport) -> Self {
        Self {
            categorical_top_k: report.categorical_top_k,
            core_features: report.core_features,
        }
    }
}

fn report_failure(operation: &str, err: &PricingError) -> Failure {
    match err.kind() {
        ErrorKind::Validation => debug!(operation, error = %err, "Request rejected by validation"),
        ErrorKind::SchemaMismatch => warn!(
            operation,
            error = %err,
            "Importance report withheld: feature names do not match the model"
        ),
        ErrorKind::Inference | ErrorKind::Artifact => error!(operation, error = %err, "Request failed"),
    }
    Failure::from(err)
}

/// Normalizer and inference engine bound to one loaded artifact
#[derive(Debug)]
pub struct PricingService {
    pipeline: Arc<LoadedPipeline>,
    normalizer: Normalizer,
    engine: InferenceEngine,
}

impl PricingService {
    pub fn new(pipeline: LoadedPipeline, config: InferenceConfig) -> Self {
        let pipeline = Arc::new(pipeline);
        let normalizer = Normalizer::new(Arc::clone(pipeline.schema()));
        let engine = InferenceEngine::from_pipeline(config, Arc::clone(&pipeline));
        Self { pipeline, normalizer, engine }
    }

    /// Load an artifact file and build a service over it
    pub fn load(
        path: impl AsRef<Path>,
        loader: &ArtifactLoader,
        config: InferenceConfig,
    ) -> Result<Self> {
        let pipeline = loader.load(path)?;
        info!(top_k = config.top_k, "Pricing service ready");
        Ok(Self::new(pipeline, config))
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.pipeline.schema()
    }

    pub fn pipeline(&self) -> &LoadedPipeline {
        &self.pipeline
    }

    /// Validate raw input and predict its price
    pub fn predict(&self, raw: &RawInput) -> Outcome<PriceQuote> {
        let result = self
            .normalizer
            .normalize(raw)
            .and_then(|record| self.engine.predict(&record));

        match result {
            Ok(estimate) => {
                info!(price = estimate.amount, currency = %estimate.currency, "Price estimated");
                Outcome::Success(PriceQuote {
                    price: estimate.amount,
                    currency: estimate.currency,
                })
            }
            Err(err) => Outcome::Failed(report_failure("predict", &err)),
        }
    }

    /// Ranked importance report, as returned to callers
    pub fn explain(&self) -> Outcome<ImportanceView> {
        match self.engine.explain() {
            Ok(report) => Outcome::Success(report.into()),
            Err(err) => Outcome::Failed(report_failure("explain", &err)),
        }
    }

    /// Full ranked report including every feature
    pub fn explain_report(&self) -> Result<RankedImportanceReport> {
        self.engine.explain()
    }

    /// Legal levels per categorical field, for input widgets
    pub fn options(&self) -> BTreeMap<String, Vec<String>> {
        self.schema().options()
    }
}
