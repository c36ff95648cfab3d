//! Error types for the car price engine

use serde::Serialize;
use thiserror::Error;

/// Result type alias for pricing operations
pub type Result<T> = std::result::Result<T, PricingError>;

/// Main error type for the car price engine
#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown category for {field}: '{value}' was not seen during training")]
    UnknownCategory { field: String, value: String },

    #[error("Value out of range for {field}: {value} (allowed {min}..={max})")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Type mismatch for {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Schema mismatch: {expected} feature names but {actual} importances")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Artifact error: {0}")]
    ArtifactError(String),

    #[error("Artifact digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse classification of a [`PricingError`], reported at the request boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Raw input did not map onto the feature schema
    Validation,
    /// The pipeline failed while transforming or predicting
    Inference,
    /// Importance vector and feature-name list disagree
    SchemaMismatch,
    /// Artifacts or configuration could not be loaded
    Artifact,
}

impl PricingError {
    /// Classify this error for reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            PricingError::MissingField(_)
            | PricingError::UnknownCategory { .. }
            | PricingError::OutOfRange { .. }
            | PricingError::TypeMismatch { .. } => ErrorKind::Validation,
            PricingError::InferenceError(_) => ErrorKind::Inference,
            PricingError::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            PricingError::ArtifactError(_)
            | PricingError::DigestMismatch { .. }
            | PricingError::ConfigError(_)
            | PricingError::DataError(_)
            | PricingError::IoError(_)
            | PricingError::SerializationError(_) => ErrorKind::Artifact,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl From<polars::error::PolarsError> for PricingError {
    fn from(err: polars::error::PolarsError) -> Self {
        PricingError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PricingError {
    fn from(err: serde_json::Error) -> Self {
        PricingError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PricingError::UnknownCategory {
            field: "Brand".to_string(),
            value: "Lamborghini".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown category for Brand: 'Lamborghini' was not seen during training"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PricingError = io_err.into();
        assert!(matches!(err, PricingError::IoError(_)));
        assert_eq!(err.kind(), ErrorKind::Artifact);
    }

    #[test]
    fn test_error_kinds() {
        assert!(PricingError::MissingField("Mileage".into()).is_validation());
        assert!(PricingError::UnknownCategory { field: "Brand".into(), value: "Lamborghini".into() }
            .is_validation());
        assert!(PricingError::OutOfRange { field: "Demand_Trend".into(), value: 6.0, min: 1.0, max: 5.0 }
            .is_validation());
        assert!(PricingError::TypeMismatch {
            field: "Car_Age".into(),
            expected: "integer".into(),
            actual: "text".into()
        }
        .is_validation());
        assert_eq!(
            PricingError::SchemaMismatch { expected: 42, actual: 40 }.kind(),
            ErrorKind::SchemaMismatch
        );
        assert_eq!(
            PricingError::InferenceError("boom".into()).kind(),
            ErrorKind::Inference
        );
    }
}
