//! Inference & explanation module
//!
//! Provides the request-time half of the pipeline:
//! - Price prediction with rounding, clamping and panic isolation
//! - Feature importance extraction, ranking and grouping
//! - Per-artifact caching of importance reports

mod config;
mod engine;
mod explain;

pub use config::{InferenceConfig, DEFAULT_TOP_K};
pub use engine::{InferenceEngine, PriceEstimate};
pub use explain::{explain, rank_importances, ExplainOptions, FeatureImportanceEntry, RankedImportanceReport};
