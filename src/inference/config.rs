//! Inference configuration

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};

/// Default number of identity features shown in an importance report
pub const DEFAULT_TOP_K: usize = 15;

/// Configuration for prediction and explanation requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Number of brand/model one-hot features kept in the identity view
    pub top_k: usize,

    /// Clamp negative model outputs to zero instead of failing the request
    pub clamp_negative_prices: bool,

    /// Cache the importance report after the first explanation
    pub cache_importances: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            clamp_negative_prices: true,
            cache_importances: true,
        }
    }
}

impl InferenceConfig {
    /// Create a new inference configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `CARPRICE_TOP_K` when set
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("CARPRICE_TOP_K") {
            let top_k = value.parse().map_err(|_| {
                PricingError::ConfigError(format!("CARPRICE_TOP_K must be a positive integer, got '{}'", value))
            })?;
            config = config.with_top_k(top_k)?;
        }
        Ok(config)
    }

    /// Builder method to set the identity view size
    pub fn with_top_k(mut self, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(PricingError::ConfigError("top_k must be at least 1".to_string()));
        }
        self.top_k = top_k;
        Ok(self)
    }

    /// Builder method to reject negative predictions
    pub fn with_clamp_negative_prices(mut self, clamp: bool) -> Self {
        self.clamp_negative_prices = clamp;
        self
    }

    /// Builder method to disable the importance cache
    pub fn without_importance_cache(mut self) -> Self {
        self.cache_importances = false;
        self
    }
}
