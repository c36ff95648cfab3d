//! Car price engine - Main Entry Point

use car_price_engine::cli::{cmd_explain, cmd_levels, cmd_predict, cmd_schema, cmd_serve, Cli, Commands};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "car_price_engine=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Predict { artifact, input, json, sha256 } => {
            cmd_predict(&artifact, input.as_deref(), json.as_deref(), sha256.as_deref())?;
        }
        Commands::Explain { artifact, top_k, sha256 } => {
            cmd_explain(&artifact, top_k, sha256.as_deref())?;
        }
        Commands::Levels { data, schema, output } => {
            cmd_levels(&data, schema.as_deref(), output.as_deref())?;
        }
        Commands::Schema { artifact } => {
            cmd_schema(&artifact)?;
        }
        Commands::Serve { artifact, host, port, sha256 } => {
            cmd_serve(&artifact, &host, port, sha256.as_deref()).await?;
        }
    }

    Ok(())
}
