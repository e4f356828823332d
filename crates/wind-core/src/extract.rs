//! Nearest-neighbor extraction of u/v values at sample points.

use crate::error::{WindError, WindResult};
use crate::field::{LonConvention, VerticalAxis, WindField};
use crate::grid::SamplePoint;
use crate::level::{LevelKind, LevelSpec};
use crate::output::VectorSample;

/// Height matched for surface-wind levels, metres above ground.
const SURFACE_WIND_HEIGHT_M: f64 = 10.0;

/// Index of the finite value minimizing |value - target|; ties go to the
/// lowest index.
fn nearest_index(values: impl Iterator<Item = f64>, target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, value) in values.enumerate() {
        let delta = (value - target).abs();
        if !delta.is_finite() {
            continue;
        }
        match best {
            Some((_, best_delta)) if delta >= best_delta => {}
            _ => best = Some((index, delta)),
        }
    }
    best.map(|(index, _)| index)
}

/// Pick the vertical plane matching a level spec.
///
/// A field without a vertical axis is a single plane regardless of the
/// spec; a field whose axis kind contradicts the spec is a level-fatal
/// dimension mismatch, handled at the orchestrator boundary.
pub fn select_level_index(field: &WindField, spec: &LevelSpec) -> WindResult<usize> {
    match (field.vertical(), spec.kind) {
        (VerticalAxis::None, _) => Ok(0),
        (VerticalAxis::HeightMeters(heights), LevelKind::Surface10m) => {
            nearest_index(heights.iter().copied(), SURFACE_WIND_HEIGHT_M).ok_or_else(|| {
                WindError::DimensionMismatch {
                    key: spec.key.clone(),
                    message: "height axis holds no finite values".to_string(),
                }
            })
        }
        (VerticalAxis::PressureHpa(pressures), LevelKind::Isobaric) => {
            let target = spec.pressure_hpa.ok_or_else(|| WindError::InvalidLevel {
                key: spec.key.clone(),
                message: "isobaric level without pressure_hpa".to_string(),
            })?;
            nearest_index(pressures.iter().copied(), target).ok_or_else(|| {
                WindError::DimensionMismatch {
                    key: spec.key.clone(),
                    message: "pressure axis holds no finite values".to_string(),
                }
            })
        }
        (VerticalAxis::HeightMeters(_), LevelKind::Isobaric) => {
            Err(WindError::DimensionMismatch {
                key: spec.key.clone(),
                message: "field carries a height-above-ground axis".to_string(),
            })
        }
        (VerticalAxis::PressureHpa(_), LevelKind::Surface10m) => {
            Err(WindError::DimensionMismatch {
                key: spec.key.clone(),
                message: "field carries an isobaric axis".to_string(),
            })
        }
    }
}

/// Convert a longitude into the convention used by the field axis.
fn reconcile_lon(lon: f64, convention: LonConvention) -> f64 {
    match convention {
        LonConvention::Unsigned => lon.rem_euclid(360.0),
        LonConvention::Signed => (lon + 180.0).rem_euclid(360.0) - 180.0,
    }
}

/// Nearest-cell u/v at a sample point.
///
/// Returns None when the nearest cell holds a non-finite component; such
/// samples are dropped from output rather than defaulted.
pub fn extract_at(
    field: &WindField,
    level_index: usize,
    point: SamplePoint,
) -> Option<VectorSample> {
    let axes = field.axes();
    let lon = reconcile_lon(point.lon, axes.lon_convention());
    let row = nearest_index((0..axes.rows()).map(|r| axes.lat_of_row(r)), point.lat)?;
    let col = nearest_index((0..axes.cols()).map(|c| axes.lon_of_col(c)), lon)?;
    let (u, v) = field.uv_at(level_index, row, col);
    if !u.is_finite() || !v.is_finite() {
        return None;
    }
    Some(VectorSample {
        lat: point.lat,
        lon: point.lon,
        u,
        v,
    })
}
