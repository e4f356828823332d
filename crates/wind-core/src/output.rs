//! Output records, written once per level per processing day.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::level::LevelSpec;
use crate::region::RegionOfInterest;
use crate::resolve::ResolvedForecast;

/// One extracted wind vector. Components are m/s at the sample point,
/// taken from the nearest field grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorSample {
    pub lat: f64,
    pub lon: f64,
    pub u: f32,
    pub v: f32,
}

/// Provenance metadata accompanying each level artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelMeta {
    /// Source label, e.g. "GFS 0.25 (NOMADS)".
    pub source: String,
    /// Run date as YYYYMMDD.
    pub run_date: String,
    /// Run cycle, e.g. "06Z".
    pub cycle_utc: String,
    pub forecast_hour: u32,
    pub t_target_utc: String,
    pub t_valid_utc: String,
    pub delta_minutes: f64,
    pub within_tolerance: bool,
    pub region: RegionOfInterest,
    pub spacing_km: f64,
    pub level: LevelSpec,
    /// Present only for failed levels; `points` is then empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn iso_z(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl LevelMeta {
    pub fn new(
        source: impl Into<String>,
        forecast: &ResolvedForecast,
        target_time: DateTime<Utc>,
        region: RegionOfInterest,
        spacing_km: f64,
        level: LevelSpec,
    ) -> Self {
        Self {
            source: source.into(),
            run_date: forecast.run_date.format("%Y%m%d").to_string(),
            cycle_utc: format!("{:02}Z", forecast.cycle),
            forecast_hour: forecast.forecast_hour,
            t_target_utc: iso_z(target_time),
            t_valid_utc: iso_z(forecast.valid_time),
            delta_minutes: forecast.delta_minutes,
            within_tolerance: forecast.within_tolerance,
            region,
            spacing_km,
            level,
            error: None,
        }
    }
}

/// One artifact: provenance plus the ordered extracted samples.
///
/// Written once, never mutated. An empty `points` together with a
/// populated `meta.error` signals a failed level; an empty `points`
/// without an error is a valid (if degenerate) outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelOutput {
    pub meta: LevelMeta,
    pub points: Vec<VectorSample>,
}

impl LevelOutput {
    /// Failure record for a level: no points, cause in metadata.
    pub fn failed(mut meta: LevelMeta, error: impl Into<String>) -> Self {
        meta.error = Some(error.into());
        Self {
            meta,
            points: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn forecast() -> ResolvedForecast {
        ResolvedForecast {
            run_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            cycle: 6,
            forecast_hour: 2,
            valid_time: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            delta_minutes: 12.0,
            within_tolerance: true,
        }
    }

    fn region() -> RegionOfInterest {
        RegionOfInterest {
            min_lat: 35.0,
            max_lat: 40.0,
            min_lon: -10.0,
            max_lon: -5.0,
        }
    }

    #[test]
    fn test_meta_identifiers() {
        let meta = LevelMeta::new(
            "GFS 0.25 (NOMADS)",
            &forecast(),
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 12, 0).unwrap(),
            region(),
            50.0,
            LevelSpec::surface_10m("10m"),
        );
        assert_eq!(meta.run_date, "20240301");
        assert_eq!(meta.cycle_utc, "06Z");
        assert_eq!(meta.t_valid_utc, "2024-03-01T08:00:00Z");
        assert_eq!(meta.t_target_utc, "2024-03-01T08:12:00Z");
        assert!(meta.error.is_none());
    }

    #[test]
    fn test_error_field_omitted_when_absent() {
        let meta = LevelMeta::new(
            "GFS 0.25 (NOMADS)",
            &forecast(),
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 12, 0).unwrap(),
            region(),
            50.0,
            LevelSpec::surface_10m("10m"),
        );
        let ok = serde_json::to_string(&LevelOutput {
            meta: meta.clone(),
            points: Vec::new(),
        })
        .unwrap();
        assert!(!ok.contains("\"error\""));

        let failed = serde_json::to_string(&LevelOutput::failed(meta, "boom")).unwrap();
        assert!(failed.contains("\"error\":\"boom\""));
        assert!(failed.contains("\"points\":[]"));
    }
}
