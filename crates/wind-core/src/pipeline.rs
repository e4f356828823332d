//! Per-level orchestration and the per-day batch driver.
//!
//! Retrieval and decoding are delegated to collaborators behind small
//! traits so the pipeline can be exercised without network access. Any
//! collaborator or extraction failure is contained at the level
//! boundary: the level yields an empty-points output carrying the error
//! message and the batch moves on to the next level.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::WindResult;
use crate::extract;
use crate::field::WindField;
use crate::grid::{sample_grid, SamplePoint};
use crate::level::LevelSpec;
use crate::output::{LevelMeta, LevelOutput, VectorSample};
use crate::region::RegionOfInterest;
use crate::resolve::{resolve, ResolvedForecast};

/// Everything a retrieval collaborator needs to locate one grid subset.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalRequest {
    pub run_date: NaiveDate,
    pub cycle: u32,
    pub forecast_hour: u32,
    pub region: RegionOfInterest,
    pub level: LevelSpec,
}

impl RetrievalRequest {
    pub fn new(forecast: &ResolvedForecast, region: RegionOfInterest, level: LevelSpec) -> Self {
        Self {
            run_date: forecast.run_date,
            cycle: forecast.cycle,
            forecast_hour: forecast.forecast_hour,
            region,
            level,
        }
    }
}

/// Retrieves raw grid bytes for one forecast/level subset.
#[async_trait]
pub trait GribFetch: Send + Sync {
    async fn fetch(&self, request: &RetrievalRequest) -> WindResult<Vec<u8>>;
}

/// Decodes raw grid bytes into a wind field.
pub trait GribDecode: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> WindResult<WindField>;
}

/// Static per-run parameters shared by every level of a batch.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Source label recorded in artifact metadata.
    pub source: String,
    pub region: RegionOfInterest,
    pub spacing_km: f64,
    pub tolerance_minutes: f64,
    /// Levels in their configured output order.
    pub levels: Vec<LevelSpec>,
}

/// Orchestrates retrieval, decoding and extraction for single levels.
pub struct LevelPipeline<'a, F, D> {
    fetcher: &'a F,
    decoder: &'a D,
}

impl<'a, F: GribFetch, D: GribDecode> LevelPipeline<'a, F, D> {
    pub fn new(fetcher: &'a F, decoder: &'a D) -> Self {
        Self { fetcher, decoder }
    }

    /// Produce the artifact for one level.
    ///
    /// Never fails: collaborator and extraction errors become an
    /// empty-points output with the cause in `meta.error`.
    pub async fn run_level(
        &self,
        forecast: &ResolvedForecast,
        target_time: DateTime<Utc>,
        config: &PipelineConfig,
        grid: &[SamplePoint],
        level: &LevelSpec,
    ) -> LevelOutput {
        let meta = LevelMeta::new(
            &config.source,
            forecast,
            target_time,
            config.region,
            config.spacing_km,
            level.clone(),
        );
        match self.extract_level(forecast, config, grid, level).await {
            Ok(points) => {
                info!(
                    level = %level.key,
                    points = points.len(),
                    sampled = grid.len(),
                    "Level complete"
                );
                LevelOutput { meta, points }
            }
            Err(e) => {
                warn!(level = %level.key, error = %e, "Level failed");
                LevelOutput::failed(meta, e.to_string())
            }
        }
    }

    async fn extract_level(
        &self,
        forecast: &ResolvedForecast,
        config: &PipelineConfig,
        grid: &[SamplePoint],
        level: &LevelSpec,
    ) -> WindResult<Vec<VectorSample>> {
        let request = RetrievalRequest::new(forecast, config.region, level.clone());
        let bytes = self.fetcher.fetch(&request).await?;
        let field = self.decoder.decode(&bytes)?;
        let level_index = extract::select_level_index(&field, level)?;
        Ok(grid
            .iter()
            .filter_map(|point| extract::extract_at(&field, level_index, *point))
            .collect())
    }
}

/// Run every configured level for one processing day.
///
/// The forecast is resolved once and the sampling grid generated once;
/// levels then run sequentially in configured order, each isolated from
/// the others' failures. Region, spacing and level-spec validation
/// errors are configuration errors and abort the batch before any
/// retrieval is attempted.
pub async fn run_day<F: GribFetch, D: GribDecode>(
    fetcher: &F,
    decoder: &D,
    target_time: DateTime<Utc>,
    config: &PipelineConfig,
) -> WindResult<Vec<LevelOutput>> {
    for level in &config.levels {
        level.validate()?;
    }
    let grid = sample_grid(&config.region, config.spacing_km)?;

    let forecast = resolve(target_time, config.tolerance_minutes);
    if forecast.within_tolerance {
        info!(
            run_date = %forecast.run_date.format("%Y%m%d"),
            cycle = forecast.cycle,
            forecast_hour = forecast.forecast_hour,
            delta_minutes = forecast.delta_minutes,
            "Resolved forecast"
        );
    } else {
        warn!(
            run_date = %forecast.run_date.format("%Y%m%d"),
            cycle = forecast.cycle,
            forecast_hour = forecast.forecast_hour,
            delta_minutes = forecast.delta_minutes,
            "No forecast within tolerance, proceeding with closest run"
        );
    }

    let pipeline = LevelPipeline::new(fetcher, decoder);
    let mut outputs = Vec::with_capacity(config.levels.len());
    for level in &config.levels {
        outputs.push(
            pipeline
                .run_level(&forecast, target_time, config, &grid, level)
                .await,
        );
    }
    Ok(outputs)
}
