//! Model artifact format and loader

use super::{FeatureEncoder, PricePipeline, RegressionModel};
use crate::error::{PricingError, Result};
use crate::normalizer::CarFeatureRecord;
use crate::schema::FeatureSchema;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Artifact format understood by this loader
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Serialized trained pipeline: schema, encoder, model and feature names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub schema: FeatureSchema,
    pub encoder: FeatureEncoder,
    pub model: RegressionModel,
    /// Post-transform feature names, aligned with the model's importances
    pub feature_names: Vec<String>,
}

impl ModelArtifact {
    /// Build an artifact whose feature names come from the encoder
    pub fn new(
        name: impl Into<String>,
        schema: FeatureSchema,
        encoder: FeatureEncoder,
        model: RegressionModel,
    ) -> Self {
        let feature_names = encoder.feature_names_out();
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            name: name.into(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            schema,
            encoder,
            model,
            feature_names,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the artifact and return its content digest
    pub fn save(&self, path: impl AsRef<Path>) -> Result<String> {
        let json = self.to_json()?;
        std::fs::write(path, &json)?;
        Ok(compute_sha256(json.as_bytes()))
    }
}

/// Compute SHA-256 hash of data
pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Reads and checks model artifacts
#[derive(Debug, Clone, Default)]
pub struct ArtifactLoader {
    expected_digest: Option<String>,
}

impl ArtifactLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse artifacts whose SHA-256 digest differs from `digest`
    pub fn with_expected_digest(mut self, digest: impl Into<String>) -> Self {
        self.expected_digest = Some(digest.into().to_ascii_lowercase());
        self
    }

    /// Load an artifact file
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadedPipeline> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let pipeline = self.load_bytes(&bytes)?;

        info!(
            path = %path.display(),
            name = %pipeline.name(),
            schema_version = %pipeline.schema().version,
            digest = %pipeline.digest(),
            n_features = pipeline.feature_names().len(),
            "Loaded model artifact"
        );

        Ok(pipeline)
    }

    /// Load an artifact from raw JSON bytes
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<LoadedPipeline> {
        let digest = compute_sha256(bytes);
        if let Some(expected) = &self.expected_digest {
            if *expected != digest {
                return Err(PricingError::DigestMismatch {
                    expected: expected.clone(),
                    actual: digest,
                });
            }
        }

        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        LoadedPipeline::from_artifact(artifact, digest)
    }
}

/// An immutable, checked pipeline ready to serve requests
#[derive(Debug, Clone)]
pub struct LoadedPipeline {
    name: String,
    digest: String,
    schema: Arc<FeatureSchema>,
    encoder: FeatureEncoder,
    model: RegressionModel,
    feature_names: Arc<[String]>,
}

impl LoadedPipeline {
    /// Check an artifact and wrap it.
    ///
    /// Width disagreements between encoder, feature names and model are only
    /// logged here; they surface per request as inference or schema mismatch
    /// errors.
    pub fn from_artifact(artifact: ModelArtifact, digest: String) -> Result<Self> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PricingError::ArtifactError(format!(
                "unsupported artifact format {} (expected {})",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        artifact.schema.validate()?;
        artifact.encoder.check_schema(&artifact.schema)?;
        artifact.model.validate()?;

        let encoded_width = artifact.encoder.n_features_out();
        if encoded_width != artifact.model.n_features() {
            warn!(
                encoder_width = encoded_width,
                model_width = artifact.model.n_features(),
                "Encoder output width differs from model input width"
            );
        }
        if artifact.feature_names != artifact.encoder.feature_names_out() {
            warn!(
                stored = artifact.feature_names.len(),
                encoder = encoded_width,
                "Stored feature names differ from encoder output names"
            );
        }

        Ok(Self {
            name: artifact.name,
            digest,
            schema: Arc::new(artifact.schema),
            encoder: artifact.encoder,
            model: artifact.model,
            feature_names: artifact.feature_names.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// SHA-256 of the artifact content
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn model(&self) -> &RegressionModel {
        &self.model
    }

    /// Stored post-transform feature names
    pub fn feature_names(&self) -> &Arc<[String]> {
        &self.feature_names
    }
}

impl PricePipeline for LoadedPipeline {
    fn transform(&self, record: &CarFeatureRecord) -> Result<Array1<f64>> {
        if record.schema_version() != self.schema.version {
            return Err(PricingError::InferenceError(format!(
                "record was validated against schema {} but pipeline expects {}",
                record.schema_version(),
                self.schema.version
            )));
        }
        self.encoder.transform(record)
    }

    fn predict_vector(&self, features: &Array1<f64>) -> Result<f64> {
        self.model.predict(features)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        Some(self.model.feature_importances())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::LinearModel;

    fn linear_artifact() -> ModelArtifact {
        let schema = FeatureSchema::car_default();
        let encoder = FeatureEncoder::from_schema(&schema).unwrap();
        let width = encoder.n_features_out();
        let model = RegressionModel::Linear(LinearModel {
            intercept: 500_000.0,
            coefficients: vec![1000.0; width],
        });
        ModelArtifact::new("linear-test", schema, encoder, model)
    }

    #[test]
    fn test_load_bytes_and_digest() {
        let json = linear_artifact().to_json().unwrap();
        let pipeline = ArtifactLoader::new().load_bytes(json.as_bytes()).unwrap();
        assert_eq!(pipeline.digest(), compute_sha256(json.as_bytes()));
        assert_eq!(pipeline.feature_names().len(), pipeline.encoder().n_features_out());
    }

    #[test]
    fn test_digest_mismatch_rejected() {
        let json = linear_artifact().to_json().unwrap();
        let err = ArtifactLoader::new()
            .with_expected_digest("00".repeat(32))
            .load_bytes(json.as_bytes())
            .unwrap_err();
        assert!(matches!(err, PricingError::DigestMismatch { .. }));
    }

    #[test]
    fn test_expected_digest_is_case_insensitive() {
        let json = linear_artifact().to_json().unwrap();
        let digest = compute_sha256(json.as_bytes()).to_ascii_uppercase();
        assert!(ArtifactLoader::new()
            .with_expected_digest(digest)
            .load_bytes(json.as_bytes())
            .is_ok());
    }

    #[test]
    fn test_unsupported_format_version() {
        let mut artifact = linear_artifact();
        artifact.format_version = 99;
        let err = LoadedPipeline::from_artifact(artifact, String::new()).unwrap_err();
        assert!(matches!(err, PricingError::ArtifactError(_)));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.json");
        let digest = linear_artifact().save(&path).unwrap();

        let pipeline = ArtifactLoader::new().with_expected_digest(digest.clone()).load(&path).unwrap();
        assert_eq!(pipeline.digest(), digest);
        assert_eq!(pipeline.name(), "linear-test");
    }
}
