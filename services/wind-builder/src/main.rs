//! Wind overlay builder.
//!
//! For each processing day: discovers the target observation timestamp,
//! resolves the closest forecast run/hour, retrieves and decodes the
//! wind grid per configured level, samples it over the region of
//! interest and writes one JSON artifact per level. A failed level never
//! fails the run; only configuration or output-path errors do.

mod artifacts;
mod config;
mod decode;
mod nomads;
mod stac;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::BuilderConfig;
use decode::GribWindDecoder;
use nomads::NomadsFetcher;
use stac::StacDiscovery;
use wind_core::run_day;

#[derive(Parser, Debug)]
#[command(name = "wind-builder")]
#[command(about = "Builds per-level wind-field JSON overlays for a processing day")]
struct Args {
    /// Processing date (YYYY-MM-DD, default: today UTC)
    date: Option<NaiveDate>,

    /// Configuration file path
    #[arg(short, long, env = "WIND_CONFIG", default_value = "config/wind_config.yaml")]
    config: PathBuf,

    /// Target timestamp override for the processing date (RFC 3339);
    /// skips discovery for that day
    #[arg(long)]
    target_time: Option<DateTime<Utc>>,

    /// Directory for per-day artifact subdirectories
    #[arg(long, env = "WIND_OUTPUT_DIR", default_value = "data/wind")]
    output_dir: PathBuf,

    /// Directory for transient downloaded grids
    #[arg(long, env = "WIND_SCRATCH_DIR", default_value = "/tmp/wind-builder")]
    scratch_dir: PathBuf,

    /// Also process this many prior calendar days, each independently
    #[arg(long, default_value = "0")]
    lookback_days: u32,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting wind overlay builder");

    let config = BuilderConfig::load(&args.config)?;
    let pipeline_config = config.pipeline();

    let fetcher = NomadsFetcher::new(config.source.filter_url.clone(), args.scratch_dir.clone())?;
    let decoder = GribWindDecoder;
    let discovery = match &config.discovery {
        Some(spec) => Some(
            StacDiscovery::new(spec.endpoint.clone(), spec.collection.clone())
                .context("cannot initialize STAC discovery")?,
        ),
        None => None,
    };

    let processing_date = args.date.unwrap_or_else(|| Utc::now().date_naive());

    for day_offset in 0..=i64::from(args.lookback_days) {
        let date = processing_date - Duration::days(day_offset);
        let fallback = config.default_target_for(date)?;

        // The CLI override pins the primary day only; lookback days keep
        // their own discovered times.
        let target_time = match (day_offset, args.target_time) {
            (0, Some(overridden)) => overridden,
            _ => match &discovery {
                Some(discovery) => discovery.discover(date, fallback).await,
                None => fallback,
            },
        };

        info!(
            date = %date,
            target = %target_time,
            levels = pipeline_config.levels.len(),
            "Processing day"
        );

        let outputs = run_day(&fetcher, &decoder, target_time, &pipeline_config)
            .await
            .with_context(|| format!("batch for {date} failed"))?;
        artifacts::write_day(&args.output_dir, date, &outputs)?;

        let failed = outputs
            .iter()
            .filter(|o| o.meta.error.is_some())
            .count();
        info!(
            date = %date,
            levels = outputs.len(),
            failed,
            "Day complete"
        );
    }

    Ok(())
}
