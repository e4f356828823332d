//! Region-of-interest bounding box.

use serde::{Deserialize, Serialize};

use crate::error::{WindError, WindResult};

/// A geographic region of interest, in degrees.
///
/// Longitudes are given in the -180..180 convention; conversion to a
/// field's own convention happens at extraction time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl RegionOfInterest {
    /// Create a validated region from its corner coordinates.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> WindResult<Self> {
        let region = Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        };
        region.validate()?;
        Ok(region)
    }

    /// Check bounds ordering and latitude range.
    pub fn validate(&self) -> WindResult<()> {
        let coords = [self.min_lat, self.max_lat, self.min_lon, self.max_lon];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(WindError::InvalidRegion(format!(
                "non-finite bound in {self:?}"
            )));
        }
        if self.min_lat >= self.max_lat {
            return Err(WindError::InvalidRegion(format!(
                "min_lat {} must be below max_lat {}",
                self.min_lat, self.max_lat
            )));
        }
        if self.min_lon >= self.max_lon {
            return Err(WindError::InvalidRegion(format!(
                "min_lon {} must be below max_lon {}",
                self.min_lon, self.max_lon
            )));
        }
        if self.min_lat < -90.0 || self.max_lat > 90.0 {
            return Err(WindError::InvalidRegion(format!(
                "latitudes {}..{} outside -90..90",
                self.min_lat, self.max_lat
            )));
        }
        Ok(())
    }

    /// Width of the region in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height of the region in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if a point is contained within this region.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_region() {
        let region = RegionOfInterest::new(35.0, 40.0, -10.0, -5.0).unwrap();
        assert_eq!(region.height(), 5.0);
        assert_eq!(region.width(), 5.0);
        assert!(region.contains(37.5, -7.5));
        assert!(!region.contains(37.5, -12.0));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(RegionOfInterest::new(40.0, 35.0, -10.0, -5.0).is_err());
        assert!(RegionOfInterest::new(35.0, 40.0, -5.0, -10.0).is_err());
    }

    #[test]
    fn test_latitude_range_enforced() {
        assert!(RegionOfInterest::new(-95.0, 40.0, -10.0, -5.0).is_err());
        assert!(RegionOfInterest::new(35.0, 92.0, -10.0, -5.0).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(RegionOfInterest::new(f64::NAN, 40.0, -10.0, -5.0).is_err());
    }
}
