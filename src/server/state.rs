//! Application state management

use crate::service::PricingService;
use chrono::{DateTime, Utc};

use super::ServerConfig;

/// Application state shared across handlers.
///
/// The service wraps an immutable artifact, so no lock is needed.
pub struct AppState {
    pub config: ServerConfig,
    pub service: PricingService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, service: PricingService) -> Self {
        Self {
            config,
            service,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        Utc::now().signed_duration_since(self.started_at).num_seconds()
    }
}
