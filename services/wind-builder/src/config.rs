//! Configuration loading for the wind builder.
//!
//! A single YAML document specifies the region of interest, sampling
//! spacing, time tolerance, the ordered level list and (optionally) the
//! STAC discovery endpoint for target timestamps.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use wind_core::{LevelSpec, PipelineConfig, RegionOfInterest};

/// Root configuration loaded from a YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct BuilderConfig {
    #[serde(default)]
    pub source: SourceConfig,
    pub region: RegionOfInterest,
    pub sampling: SamplingConfig,
    #[serde(default = "default_tolerance_minutes")]
    pub tolerance_minutes: f64,
    /// Fallback target time of day, UTC ("HH:MM:SS").
    #[serde(default = "default_target_time")]
    pub target_time_utc: String,
    /// Levels in output order.
    pub levels: Vec<LevelSpec>,
    /// Optional STAC catalog used to discover per-day target timestamps.
    #[serde(default)]
    pub discovery: Option<DiscoveryConfig>,
}

/// Forecast source identification and endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_id")]
    pub id: String,
    #[serde(default = "default_filter_url")]
    pub filter_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            id: default_source_id(),
            filter_url: default_filter_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    /// Approximate physical spacing between sample points, km.
    pub spacing_km: f64,
}

/// STAC search parameters for target-time discovery.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    pub endpoint: String,
    pub collection: String,
}

fn default_tolerance_minutes() -> f64 {
    90.0
}

fn default_target_time() -> String {
    "05:00:00".to_string()
}

fn default_source_id() -> String {
    "GFS 0.25 (NOMADS)".to_string()
}

fn default_filter_url() -> String {
    "https://nomads.ncep.noaa.gov/cgi-bin/filter_gfs_0p25.pl".to_string()
}

impl BuilderConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: BuilderConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        debug!(path = %path.display(), levels = config.levels.len(), "Loaded configuration");
        Ok(config)
    }

    /// Reject configurations the pipeline could not run with.
    pub fn validate(&self) -> Result<()> {
        self.region.validate()?;
        if !self.sampling.spacing_km.is_finite() || self.sampling.spacing_km <= 0.0 {
            bail!(
                "sampling.spacing_km must be positive, got {}",
                self.sampling.spacing_km
            );
        }
        if !self.tolerance_minutes.is_finite() || self.tolerance_minutes < 0.0 {
            bail!(
                "tolerance_minutes must be non-negative, got {}",
                self.tolerance_minutes
            );
        }
        if self.levels.is_empty() {
            bail!("at least one level must be configured");
        }
        for level in &self.levels {
            level.validate()?;
        }
        self.parse_target_time()
            .with_context(|| format!("invalid target_time_utc '{}'", self.target_time_utc))?;
        Ok(())
    }

    /// Core pipeline parameters derived from this configuration.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            source: self.source.id.clone(),
            region: self.region,
            spacing_km: self.sampling.spacing_km,
            tolerance_minutes: self.tolerance_minutes,
            levels: self.levels.clone(),
        }
    }

    fn parse_target_time(&self) -> Result<NaiveTime> {
        let raw = self.target_time_utc.trim_end_matches('Z');
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .with_context(|| format!("expected HH:MM:SS, got '{}'", self.target_time_utc))
    }

    /// The fallback target timestamp for a processing date, composed from
    /// the configured time of day.
    pub fn default_target_for(&self, date: NaiveDate) -> Result<DateTime<Utc>> {
        let time = self.parse_target_time()?;
        Ok(Utc.from_utc_datetime(&date.and_time(time)))
    }
}
