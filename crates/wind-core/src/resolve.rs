//! Forecast run and forecast-hour selection against a target timestamp.
//!
//! Model runs start every 6 hours (00/06/12/18 UTC) and provide hourly
//! valid times. Resolution scans runs from the target day and the prior
//! day, a narrow forecast-hour window around each run's offset to the
//! target, and picks the candidate whose valid time is closest. Ties go
//! to the most recent run. When nothing lands within tolerance the scan
//! widens and the globally closest candidate is returned with
//! `within_tolerance` cleared, so resolution always succeeds.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Daily model run start hours, UTC.
pub const RUN_CYCLES: [u32; 4] = [0, 6, 12, 18];

/// Forecast-hour half-window around the run-to-target offset. Runs are 6
/// hours apart, so +-3 already covers the true nearest candidate.
const NARROW_WINDOW_HOURS: i64 = 3;

/// Half-window for the fallback scan when nothing is within tolerance.
const WIDE_WINDOW_HOURS: i64 = 12;

/// One candidate forecast valid time, generated and discarded during
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastCandidate {
    pub run_date: NaiveDate,
    /// Run start hour, one of [`RUN_CYCLES`].
    pub cycle: u32,
    pub forecast_hour: u32,
    pub valid_time: DateTime<Utc>,
}

impl ForecastCandidate {
    fn new(run_date: NaiveDate, cycle: u32, forecast_hour: u32) -> Self {
        let run = run_datetime(run_date, cycle);
        Self {
            run_date,
            cycle,
            forecast_hour,
            valid_time: run + Duration::hours(i64::from(forecast_hour)),
        }
    }

    /// The run's start instant (date plus cycle hour).
    pub fn run_datetime(&self) -> DateTime<Utc> {
        run_datetime(self.run_date, self.cycle)
    }

    fn delta_minutes(&self, target: DateTime<Utc>) -> f64 {
        (self.valid_time - target).num_seconds().abs() as f64 / 60.0
    }
}

/// The forecast chosen for a target timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedForecast {
    pub run_date: NaiveDate,
    pub cycle: u32,
    pub forecast_hour: u32,
    pub valid_time: DateTime<Utc>,
    /// Absolute |valid - target| in minutes.
    pub delta_minutes: f64,
    /// False when the widened fallback search was needed.
    pub within_tolerance: bool,
}

fn run_datetime(run_date: NaiveDate, cycle: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&run_date.and_time(NaiveTime::MIN)) + Duration::hours(i64::from(cycle))
}

/// Enumerate candidates for runs on the target day and the prior day,
/// scanning forecast hours within `window_hours` of each run's integer
/// offset to the target. Forecast hours never go below zero.
fn candidates(target: DateTime<Utc>, window_hours: i64) -> Vec<ForecastCandidate> {
    let mut out = Vec::new();
    for day_offset in 0..=1 {
        let run_date = (target - Duration::days(day_offset)).date_naive();
        for &cycle in &RUN_CYCLES {
            let run = run_datetime(run_date, cycle);
            let offset_hours =
                ((target - run).num_seconds() as f64 / 3600.0).round() as i64;
            let first = (offset_hours - window_hours).max(0);
            let last = offset_hours + window_hours;
            for fhr in first..=last {
                out.push(ForecastCandidate::new(run_date, cycle, fhr as u32));
            }
        }
    }
    out
}

/// Minimum-delta candidate; ties broken toward the most recent run.
fn pick_best(
    candidates: &[ForecastCandidate],
    target: DateTime<Utc>,
) -> Option<ForecastCandidate> {
    let mut best: Option<(ForecastCandidate, f64)> = None;
    for candidate in candidates {
        let delta = candidate.delta_minutes(target);
        let better = match &best {
            None => true,
            Some((current, current_delta)) => {
                delta < *current_delta
                    || (delta == *current_delta
                        && candidate.run_datetime() > current.run_datetime())
            }
        };
        if better {
            best = Some((*candidate, delta));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Resolve the forecast whose valid time best matches `target`.
///
/// Total: always returns a candidate. When no candidate is within
/// `tolerance_minutes` the widened fallback scan supplies the globally
/// closest one and `within_tolerance` is false; the degradation is for
/// the caller to record, not a failure.
pub fn resolve(target: DateTime<Utc>, tolerance_minutes: f64) -> ResolvedForecast {
    let narrow = candidates(target, NARROW_WINDOW_HOURS);
    let in_tolerance: Vec<ForecastCandidate> = narrow
        .iter()
        .filter(|c| c.delta_minutes(target) <= tolerance_minutes)
        .copied()
        .collect();

    let chosen = match pick_best(&in_tolerance, target) {
        Some(candidate) => candidate,
        None => {
            debug!(
                target = %target,
                tolerance_minutes,
                "No candidate within tolerance, widening forecast-hour scan"
            );
            let wide = candidates(target, WIDE_WINDOW_HOURS);
            pick_best(&wide, target).expect("cycle scan always yields candidates")
        }
    };

    let delta_minutes = chosen.delta_minutes(target);
    ResolvedForecast {
        run_date: chosen.run_date,
        cycle: chosen.cycle,
        forecast_hour: chosen.forecast_hour,
        valid_time: chosen.valid_time,
        delta_minutes,
        within_tolerance: delta_minutes <= tolerance_minutes,
    }
}
