//! Prediction pipeline module
//!
//! A pipeline is a fitted preprocessing step plus a regression model:
//! - [`FeatureEncoder`] one-hot encodes categorical columns
//! - [`RegressionModel`] maps the encoded vector to a price
//! - [`ArtifactLoader`] reads both, with the schema and feature names,
//!   from a content-addressed JSON artifact

mod artifact;
mod encoder;
mod model;

pub use artifact::{compute_sha256, ArtifactLoader, LoadedPipeline, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use encoder::{CategoricalColumn, FeatureEncoder, NumericColumn};
pub use model::{Aggregation, LinearModel, RegressionModel, TreeEnsemble, TreeNode};

use crate::error::Result;
use crate::normalizer::CarFeatureRecord;
use ndarray::Array1;

/// Capability exposed by a loaded prediction pipeline.
///
/// Implementations are immutable once loaded and shared across requests.
pub trait PricePipeline: Send + Sync {
    /// Encode a validated record into the model's feature space
    fn transform(&self, record: &CarFeatureRecord) -> Result<Array1<f64>>;

    /// Predict from an already transformed feature vector
    fn predict_vector(&self, features: &Array1<f64>) -> Result<f64>;

    /// Transform and predict in one step
    fn predict(&self, record: &CarFeatureRecord) -> Result<f64> {
        let features = self.transform(record)?;
        self.predict_vector(&features)
    }

    /// Importances over the post-transform feature space, if the model has them
    fn feature_importances(&self) -> Option<Array1<f64>>;
}
