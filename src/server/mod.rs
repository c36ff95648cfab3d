//! HTTP server module
//!
//! REST surface over the pricing service: prediction, importance reports,
//! schema and dropdown options.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use crate::inference::InferenceConfig;
use crate::pipeline::ArtifactLoader;
use crate::service::PricingService;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub artifact_path: PathBuf,
    pub artifact_sha256: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            artifact_path: std::env::var("CARPRICE_ARTIFACT")
                .unwrap_or_else(|_| "./models/car_price_artifact.json".to_string())
                .into(),
            artifact_sha256: std::env::var("CARPRICE_ARTIFACT_SHA256").ok(),
        }
    }
}

impl ServerConfig {
    pub fn loader(&self) -> ArtifactLoader {
        match &self.artifact_sha256 {
            Some(digest) => ArtifactLoader::new().with_expected_digest(digest.clone()),
            None => ArtifactLoader::new(),
        }
    }
}

/// Load the artifact and serve until ctrl+c
pub async fn run_server(config: ServerConfig, inference: InferenceConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        artifact = %config.artifact_path.display(),
        started_at = %start_time.to_rfc3339(),
        "Loading pricing artifact"
    );

    let service = PricingService::load(&config.artifact_path, &config.loader(), inference)?;
    let state = Arc::new(AppState::new(config.clone(), service));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        address = %addr,
        "Car price server starting"
    );
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown_signal = async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for shutdown signal");
            return;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
