//! Deterministic sampling-grid generation over a region of interest.

use serde::{Deserialize, Serialize};

use crate::error::{WindError, WindResult};
use crate::region::RegionOfInterest;

/// Kilometres per degree of latitude (and of longitude at the equator).
const KM_PER_DEGREE: f64 = 111.32;

/// Floor applied to cos(lat) so longitude steps stay bounded near the poles.
const MIN_COS_LAT: f64 = 0.15;

/// Tolerance for including the far boundary despite floating-point stepping.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// One sampling location, rounded to 5 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub lat: f64,
    pub lon: f64,
}

fn round5(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

/// Generate the ordered sample grid for a region at the given spacing.
///
/// Latitude-major, both axes ascending and boundary-inclusive. The
/// latitude step is constant; the longitude step widens with latitude to
/// keep the physical spacing approximately uniform. Coordinates are
/// computed by index multiplication, not accumulation, so identical
/// inputs always produce the identical point sequence.
pub fn sample_grid(region: &RegionOfInterest, spacing_km: f64) -> WindResult<Vec<SamplePoint>> {
    region.validate()?;
    if !spacing_km.is_finite() || spacing_km <= 0.0 {
        return Err(WindError::InvalidSpacing(format!(
            "spacing_km must be positive, got {spacing_km}"
        )));
    }

    let lat_step = spacing_km / KM_PER_DEGREE;
    let mut points = Vec::new();

    let mut row = 0u32;
    loop {
        let lat = region.min_lat + f64::from(row) * lat_step;
        if lat > region.max_lat + BOUNDARY_EPSILON {
            break;
        }
        let lon_step = spacing_km / (KM_PER_DEGREE * lat.to_radians().cos().max(MIN_COS_LAT));
        let mut col = 0u32;
        loop {
            let lon = region.min_lon + f64::from(col) * lon_step;
            if lon > region.max_lon + BOUNDARY_EPSILON {
                break;
            }
            points.push(SamplePoint {
                lat: round5(lat),
                lon: round5(lon),
            });
            col += 1;
        }
        row += 1;
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> RegionOfInterest {
        RegionOfInterest {
            min_lat: 35.0,
            max_lat: 40.0,
            min_lon: -10.0,
            max_lon: -5.0,
        }
    }

    #[test]
    fn test_first_point_and_final_row() {
        let points = sample_grid(&region(), 50.0).unwrap();
        let first = points[0];
        assert_eq!(first.lat, 35.0);
        assert_eq!(first.lon, -10.0);

        let last = points[points.len() - 1];
        assert!(last.lat <= 40.0 + BOUNDARY_EPSILON);
        assert!(last.lat > 39.0, "final row should approach max_lat");
    }

    #[test]
    fn test_deterministic_and_restartable() {
        let a = sample_grid(&region(), 50.0).unwrap();
        let b = sample_grid(&region(), 50.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_latitude_major_ascending_order() {
        let points = sample_grid(&region(), 50.0).unwrap();
        for pair in points.windows(2) {
            let ordered = pair[0].lat < pair[1].lat
                || (pair[0].lat == pair[1].lat && pair[0].lon < pair[1].lon);
            assert!(ordered, "points must be ordered lat-major: {pair:?}");
        }
    }

    #[test]
    fn test_halving_spacing_roughly_quadruples_count() {
        let coarse = sample_grid(&region(), 50.0).unwrap().len() as f64;
        let fine = sample_grid(&region(), 25.0).unwrap().len() as f64;
        let ratio = fine / coarse;
        assert!((3.0..5.0).contains(&ratio), "ratio was {ratio}");
    }

    #[test]
    fn test_invalid_spacing_rejected() {
        assert!(matches!(
            sample_grid(&region(), 0.0),
            Err(WindError::InvalidSpacing(_))
        ));
        assert!(sample_grid(&region(), -10.0).is_err());
        assert!(sample_grid(&region(), f64::NAN).is_err());
    }

    #[test]
    fn test_rounded_to_five_decimals() {
        let points = sample_grid(&region(), 33.3).unwrap();
        for p in points {
            assert_eq!(p.lat, round5(p.lat));
            assert_eq!(p.lon, round5(p.lon));
        }
    }

    #[test]
    fn test_longitude_step_widens_toward_poles() {
        let polar = RegionOfInterest {
            min_lat: 80.0,
            max_lat: 82.0,
            min_lon: 0.0,
            max_lon: 10.0,
        };
        let equatorial = RegionOfInterest {
            min_lat: 0.0,
            max_lat: 2.0,
            min_lon: 0.0,
            max_lon: 10.0,
        };
        let polar_points = sample_grid(&polar, 50.0).unwrap().len();
        let equatorial_points = sample_grid(&equatorial, 50.0).unwrap().len();
        assert!(polar_points < equatorial_points);
    }
}
