//! Car price CLI module
//!
//! Command-line interface for prediction, importance charts, level
//! discovery and serving.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use crate::inference::{FeatureImportanceEntry, InferenceConfig};
use crate::normalizer::RawInput;
use crate::pipeline::ArtifactLoader;
use crate::schema::{levels_from_csv, FeatureSchema, FieldKind};
use crate::server::{run_server, ServerConfig};
use crate::service::{Outcome, PricingService};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const BAR_WIDTH: usize = 40;

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn bad(s: &str) -> ColoredString    { s.truecolor(255, 100, 100) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

/// Group digits in thousands: 1234567 -> 1,234,567
fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Horizontal bar chart, bars scaled to the largest weight
fn print_bars(entries: &[FeatureImportanceEntry]) {
    let max = entries.iter().map(|e| e.weight).fold(0.0_f64, f64::max);
    let label_width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);

    for entry in entries {
        let len = if max > 0.0 {
            ((entry.weight / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        println!(
            "  {:<width$}  {} {}",
            entry.name,
            ok(&"█".repeat(len)),
            dim(&format!("{:.4}", entry.weight)),
            width = label_width
        );
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "car-price")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Car resale price prediction and feature importance")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the price of one car
    Predict {
        /// Model artifact file
        #[arg(short, long, env = "CARPRICE_ARTIFACT")]
        artifact: PathBuf,

        /// JSON file with the car's fields
        #[arg(short, long, conflicts_with = "json")]
        input: Option<PathBuf>,

        /// Inline JSON object with the car's fields
        #[arg(long)]
        json: Option<String>,

        /// Expected SHA-256 of the artifact
        #[arg(long, env = "CARPRICE_ARTIFACT_SHA256")]
        sha256: Option<String>,
    },

    /// Show ranked feature importances as a bar chart
    Explain {
        /// Model artifact file
        #[arg(short, long, env = "CARPRICE_ARTIFACT")]
        artifact: PathBuf,

        /// Number of brand/model features to show
        #[arg(short = 'k', long, env = "CARPRICE_TOP_K", default_value = "15")]
        top_k: usize,

        /// Expected SHA-256 of the artifact
        #[arg(long, env = "CARPRICE_ARTIFACT_SHA256")]
        sha256: Option<String>,
    },

    /// Discover categorical levels from training data
    Levels {
        /// Training data CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Schema to update (defaults to the built-in car schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Write the updated schema here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the schema of an artifact
    Schema {
        /// Model artifact file
        #[arg(short, long, env = "CARPRICE_ARTIFACT")]
        artifact: PathBuf,
    },

    /// Start the HTTP server
    Serve {
        /// Model artifact file
        #[arg(short, long, env = "CARPRICE_ARTIFACT")]
        artifact: PathBuf,

        /// Host to bind to
        #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "API_PORT", default_value = "8080")]
        port: u16,

        /// Expected SHA-256 of the artifact
        #[arg(long, env = "CARPRICE_ARTIFACT_SHA256")]
        sha256: Option<String>,
    },
}

fn loader(sha256: Option<&str>) -> ArtifactLoader {
    match sha256 {
        Some(digest) => ArtifactLoader::new().with_expected_digest(digest),
        None => ArtifactLoader::new(),
    }
}

fn read_input(input: Option<&Path>, json: Option<&str>) -> anyhow::Result<RawInput> {
    let text = match (input, json) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input {}", path.display()))?,
        (None, Some(json)) => json.to_string(),
        (None, None) => bail!("provide the car's fields with --input FILE or --json STRING"),
    };
    serde_json::from_str(&text).context("input must be a JSON object of field values")
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_predict(
    artifact: &Path,
    input: Option<&Path>,
    json: Option<&str>,
    sha256: Option<&str>,
) -> anyhow::Result<()> {
    let raw = read_input(input, json)?;
    let service = PricingService::load(artifact, &loader(sha256), InferenceConfig::from_env()?)?;

    section("Price estimate");
    println!("  {}", kv("artifact", service.pipeline().name()));
    println!("  {}", kv("schema  ", &service.schema().version));

    match service.predict(&raw) {
        Outcome::Success(quote) => {
            println!();
            println!(
                "  {} {} {}",
                ok("✓"),
                "Estimated price:".white().bold(),
                accent(&format!("{} {}", quote.currency, format_amount(quote.price))).bold()
            );
            println!();
            Ok(())
        }
        Outcome::Failed(failure) => {
            println!();
            println!("  {} {}", bad("✗"), failure.error);
            println!();
            bail!("prediction failed ({:?})", failure.kind)
        }
    }
}

pub fn cmd_explain(artifact: &Path, top_k: usize, sha256: Option<&str>) -> anyhow::Result<()> {
    let config = InferenceConfig::new().with_top_k(top_k)?;
    let service = PricingService::load(artifact, &loader(sha256), config)?;

    let report = match service.explain_report() {
        Ok(report) => report,
        Err(err) => {
            println!("  {} Could not display feature importance: {}", bad("⚠"), err);
            bail!("explanation failed ({:?})", err.kind());
        }
    };

    section(&format!("Top {} brand & model features", top_k));
    print_bars(&report.categorical_top_k);

    section("Core features");
    print_bars(&report.core_features);

    println!();
    println!(
        "  {}",
        dim(&format!("{} features, total weight {:.4}", report.ranked.len(), report.total_weight()))
    );
    println!();
    Ok(())
}

pub fn cmd_levels(data: &Path, schema: Option<&Path>, output: Option<&Path>) -> anyhow::Result<()> {
    let mut schema = match schema {
        Some(path) => FeatureSchema::load(path)?,
        None => FeatureSchema::car_default(),
    };

    let columns: Vec<String> = schema
        .fields
        .iter()
        .filter(|f| matches!(f.kind, FieldKind::Categorical { .. }))
        .map(|f| f.name.clone())
        .collect();
    let column_refs: Vec<&str> = columns.iter().map(String::as_str).collect();

    let levels = levels_from_csv(data, &column_refs)?;
    for (name, values) in levels {
        eprintln!("  {} {} {}", ok("✓"), name.white().bold(), dim(&format!("{} levels", values.len())));
        schema.set_levels(&name, values)?;
    }
    schema.validate()?;

    match output {
        Some(path) => {
            schema.save(path)?;
            eprintln!("  {} {}", ok("✓"), kv("schema written to", &path.display().to_string()));
        }
        None => println!("{}", serde_json::to_string_pretty(&schema)?),
    }
    Ok(())
}

pub fn cmd_schema(artifact: &Path) -> anyhow::Result<()> {
    let pipeline = ArtifactLoader::new().load(artifact)?;
    println!("{}", serde_json::to_string_pretty(&**pipeline.schema())?);
    Ok(())
}

pub async fn cmd_serve(
    artifact: &Path,
    host: &str,
    port: u16,
    sha256: Option<&str>,
) -> anyhow::Result<()> {
    let config = ServerConfig {
        host: host.to_string(),
        port,
        artifact_path: artifact.to_path_buf(),
        artifact_sha256: sha256.map(str::to_string),
    };
    run_server(config, InferenceConfig::from_env()?).await
}
