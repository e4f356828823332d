//! Level-isolation and batch-driver behavior with mock collaborators.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use wind_core::{
    run_day, GribDecode, GribFetch, GridAxes, LevelOutput, LevelSpec, PipelineConfig,
    RegionOfInterest, RetrievalRequest, VerticalAxis, WindError, WindField, WindResult,
};

/// Fetcher that fails for level keys listed in `failing`, otherwise
/// returns the level key as payload.
struct ScriptedFetcher {
    failing: Vec<&'static str>,
}

#[async_trait]
impl GribFetch for ScriptedFetcher {
    async fn fetch(&self, request: &RetrievalRequest) -> WindResult<Vec<u8>> {
        if self.failing.contains(&request.level.key.as_str()) {
            return Err(WindError::Retrieval(format!(
                "HTTP 404 for level {}",
                request.level.key
            )));
        }
        Ok(request.level.key.clone().into_bytes())
    }
}

/// Decoder producing a small constant field over the test region, or a
/// missing-variable error when told to.
struct ScriptedDecoder {
    missing_variable_for: Vec<&'static str>,
}

impl GribDecode for ScriptedDecoder {
    fn decode(&self, bytes: &[u8]) -> WindResult<WindField> {
        let key = String::from_utf8_lossy(bytes).to_string();
        if self.missing_variable_for.contains(&key.as_str()) {
            return Err(WindError::MissingVariable(format!(
                "no u/v pair in decoded grid for {key}"
            )));
        }
        let lats: Vec<f64> = (0..21).map(|i| 35.0 + f64::from(i) * 0.25).collect();
        let lons: Vec<f64> = (0..21).map(|i| -10.0 + f64::from(i) * 0.25).collect();
        let cells = lats.len() * lons.len();
        WindField::new(
            GridAxes::Separable { lats, lons },
            VerticalAxis::None,
            vec![3.5; cells],
            vec![-1.25; cells],
        )
    }
}

fn config(levels: Vec<LevelSpec>) -> PipelineConfig {
    PipelineConfig {
        source: "GFS 0.25 (NOMADS)".to_string(),
        region: RegionOfInterest {
            min_lat: 35.0,
            max_lat: 40.0,
            min_lon: -10.0,
            max_lon: -5.0,
        },
        spacing_km: 50.0,
        tolerance_minutes: 90.0,
        levels,
    }
}

fn all_levels() -> Vec<LevelSpec> {
    vec![
        LevelSpec::surface_10m("10m"),
        LevelSpec::isobaric("900hPa", 900.0),
        LevelSpec::isobaric("400hPa", 400.0),
    ]
}

fn target() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 5, 0, 0).unwrap()
}

#[tokio::test]
async fn test_all_levels_succeed() {
    let fetcher = ScriptedFetcher { failing: vec![] };
    let decoder = ScriptedDecoder {
        missing_variable_for: vec![],
    };
    let outputs = run_day(&fetcher, &decoder, target(), &config(all_levels()))
        .await
        .unwrap();

    assert_eq!(outputs.len(), 3);
    for output in &outputs {
        assert!(output.meta.error.is_none());
        assert!(!output.points.is_empty());
        assert_eq!(output.meta.run_date, "20240301");
        assert_eq!(output.meta.cycle_utc, "00Z");
        assert_eq!(output.meta.forecast_hour, 5);
        assert!(output.meta.within_tolerance);
    }
    // Levels come back in configured order.
    let keys: Vec<&str> = outputs.iter().map(|o| o.meta.level.key.as_str()).collect();
    assert_eq!(keys, vec!["10m", "900hPa", "400hPa"]);
}

#[tokio::test]
async fn test_one_failing_level_does_not_abort_batch() {
    let fetcher = ScriptedFetcher {
        failing: vec!["900hPa"],
    };
    let decoder = ScriptedDecoder {
        missing_variable_for: vec![],
    };
    let outputs = run_day(&fetcher, &decoder, target(), &config(all_levels()))
        .await
        .unwrap();

    assert_eq!(outputs.len(), 3);
    let failed = &outputs[1];
    assert_eq!(failed.meta.level.key, "900hPa");
    assert!(failed.points.is_empty());
    let error = failed.meta.error.as_deref().unwrap();
    assert!(error.contains("HTTP 404"), "error was: {error}");

    assert!(outputs[0].meta.error.is_none());
    assert!(outputs[2].meta.error.is_none());
}

#[tokio::test]
async fn test_sibling_outputs_identical_with_and_without_failing_level() {
    let decoder = ScriptedDecoder {
        missing_variable_for: vec![],
    };

    let with_failure = run_day(
        &ScriptedFetcher {
            failing: vec!["900hPa"],
        },
        &decoder,
        target(),
        &config(all_levels()),
    )
    .await
    .unwrap();

    let without_level = run_day(
        &ScriptedFetcher { failing: vec![] },
        &decoder,
        target(),
        &config(vec![
            LevelSpec::surface_10m("10m"),
            LevelSpec::isobaric("400hPa", 400.0),
        ]),
    )
    .await
    .unwrap();

    let serialize = |output: &LevelOutput| serde_json::to_string(output).unwrap();
    assert_eq!(serialize(&with_failure[0]), serialize(&without_level[0]));
    assert_eq!(serialize(&with_failure[2]), serialize(&without_level[1]));
}

#[tokio::test]
async fn test_missing_variable_reported_as_level_error() {
    let fetcher = ScriptedFetcher { failing: vec![] };
    let decoder = ScriptedDecoder {
        missing_variable_for: vec!["400hPa"],
    };
    let outputs = run_day(&fetcher, &decoder, target(), &config(all_levels()))
        .await
        .unwrap();

    let failed = &outputs[2];
    assert!(failed.points.is_empty());
    assert!(failed
        .meta
        .error
        .as_deref()
        .unwrap()
        .contains("Missing variable"));
    assert!(outputs[0].meta.error.is_none());
    assert!(outputs[1].meta.error.is_none());
}

#[tokio::test]
async fn test_invalid_spacing_is_fatal_before_any_retrieval() {
    let fetcher = ScriptedFetcher { failing: vec![] };
    let decoder = ScriptedDecoder {
        missing_variable_for: vec![],
    };
    let mut bad = config(all_levels());
    bad.spacing_km = 0.0;
    let result = run_day(&fetcher, &decoder, target(), &bad).await;
    assert!(matches!(result, Err(WindError::InvalidSpacing(_))));
}

#[tokio::test]
async fn test_degraded_resolution_is_recorded_not_fatal() {
    let fetcher = ScriptedFetcher { failing: vec![] };
    let decoder = ScriptedDecoder {
        missing_variable_for: vec![],
    };
    let mut cfg = config(all_levels());
    cfg.tolerance_minutes = 5.0;
    let outputs = run_day(
        &fetcher,
        &decoder,
        Utc.with_ymd_and_hms(2024, 3, 1, 5, 30, 0).unwrap(),
        &cfg,
    )
    .await
    .unwrap();

    for output in &outputs {
        assert!(!output.meta.within_tolerance);
        assert_eq!(output.meta.delta_minutes, 30.0);
        assert!(output.meta.error.is_none());
        assert!(!output.points.is_empty());
    }
}
