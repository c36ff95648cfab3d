//! Car price engine - resale price prediction for used cars
//!
//! This crate turns one car's user-supplied attributes into a price estimate
//! using a pre-trained pipeline, and reports which features drive the model.
//!
//! # Modules
//!
//! - [`schema`] - Feature schema: fields, legal levels, numeric ranges
//! - [`normalizer`] - Raw input validation and coercion
//! - [`pipeline`] - Artifact loading, one-hot encoding, regression models
//! - [`inference`] - Prediction and ranked feature importance
//! - [`service`] - Request boundary returning structured outcomes
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Pricing pipeline
pub mod schema;
pub mod normalizer;
pub mod pipeline;
pub mod inference;
pub mod service;

// Services
pub mod server;
pub mod cli;

pub use error::{ErrorKind, PricingError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{ErrorKind, PricingError, Result};
    pub use crate::inference::{
        FeatureImportanceEntry, InferenceConfig, InferenceEngine, PriceEstimate,
        RankedImportanceReport,
    };
    pub use crate::normalizer::{normalize, CarFeatureRecord, Normalizer, RawInput, RawValue};
    pub use crate::pipeline::{ArtifactLoader, LoadedPipeline, ModelArtifact, PricePipeline};
    pub use crate::schema::{FeatureSchema, FieldKind, FieldSpec};
    pub use crate::service::{Outcome, PricingService};
}
