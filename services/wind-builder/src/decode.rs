//! GRIB2 decode collaborator built on the `grib` crate.
//!
//! Probes every submessage for u/v wind components rather than assuming
//! a fixed layout: NOMADS subsets usually carry exactly one UGRD and one
//! VGRD message, but multi-level subsets pair the components once per
//! fixed surface. Identification goes by discipline/category/parameter
//! numbers first, falling back to the code-table parameter names when
//! the numbers are missing or non-standard.

use std::io::Cursor;

use grib::codetables::{CodeTable4_2, Lookup};
use tracing::debug;

use wind_core::{GribDecode, GridAxes, VerticalAxis, WindError, WindField, WindResult};

/// GRIB2 discipline 0: meteorological products.
const DISCIPLINE_METEOROLOGICAL: u8 = 0;
/// Parameter category 2 within discipline 0: momentum.
const CATEGORY_MOMENTUM: u8 = 2;
/// Parameter numbers within the momentum category.
const PARAMETER_U_COMPONENT: u8 = 2;
const PARAMETER_V_COMPONENT: u8 = 3;

/// Code table 4.5 fixed-surface types.
const SURFACE_ISOBARIC: u8 = 100;
const SURFACE_HEIGHT_ABOVE_GROUND: u8 = 103;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindComponent {
    U,
    V,
}

/// One decoded component plane plus its vertical placement.
struct ComponentPlane {
    surface_type: Option<u8>,
    surface_value: f64,
    lats: Vec<f64>,
    lons: Vec<f64>,
    values: Vec<f32>,
}

/// Decoder turning NOMADS GRIB2 subsets into [`WindField`]s.
pub struct GribWindDecoder;

impl GribWindDecoder {
    fn classify(discipline: u8, category: u8, number: u8) -> Option<WindComponent> {
        if discipline != DISCIPLINE_METEOROLOGICAL {
            return None;
        }
        if category == CATEGORY_MOMENTUM {
            match number {
                PARAMETER_U_COMPONENT => return Some(WindComponent::U),
                PARAMETER_V_COMPONENT => return Some(WindComponent::V),
                _ => {}
            }
        }
        // Name probe for grids whose numbers differ from the WMO layout.
        let name = CodeTable4_2::new(discipline, category)
            .lookup(usize::from(number))
            .to_string()
            .to_lowercase();
        if name.contains("u-component of wind") {
            Some(WindComponent::U)
        } else if name.contains("v-component of wind") {
            Some(WindComponent::V)
        } else {
            None
        }
    }

    /// Build the vertical axis shared by the paired u/v planes.
    ///
    /// Height-above-ground and isobaric surfaces become real axes; any
    /// other surface type degenerates to a single anonymous plane (the
    /// "collapse extra dimensions to their first index" rule).
    fn vertical_axis(planes: &[ComponentPlane]) -> VerticalAxis {
        let surface_type = planes.iter().find_map(|p| p.surface_type);
        match surface_type {
            Some(SURFACE_HEIGHT_ABOVE_GROUND) => {
                VerticalAxis::HeightMeters(planes.iter().map(|p| p.surface_value).collect())
            }
            Some(SURFACE_ISOBARIC) => {
                // GRIB carries isobaric surfaces in Pa.
                VerticalAxis::PressureHpa(
                    planes.iter().map(|p| p.surface_value / 100.0).collect(),
                )
            }
            _ => VerticalAxis::None,
        }
    }
}

impl GribDecode for GribWindDecoder {
    fn decode(&self, bytes: &[u8]) -> WindResult<WindField> {
        let grib2 = grib::from_reader(Cursor::new(bytes))
            .map_err(|e| WindError::Decode(format!("not a readable GRIB2 file: {e}")))?;

        let mut u_planes: Vec<ComponentPlane> = Vec::new();
        let mut v_planes: Vec<ComponentPlane> = Vec::new();

        for (_index, submessage) in grib2.iter() {
            let discipline = submessage.indicator().discipline;
            let (Some(category), Some(number)) = (
                submessage.prod_def().parameter_category(),
                submessage.prod_def().parameter_number(),
            ) else {
                continue;
            };
            let Some(component) = Self::classify(discipline, category, number) else {
                continue;
            };

            let (surface_type, surface_value) = match submessage.prod_def().fixed_surfaces() {
                Some((first, _)) => (Some(first.surface_type), first.value()),
                None => (None, f64::NAN),
            };

            let mut lats = Vec::new();
            let mut lons = Vec::new();
            for (lat, lon) in submessage
                .latlons()
                .map_err(|e| WindError::Decode(format!("unsupported grid geometry: {e}")))?
            {
                lats.push(f64::from(lat));
                lons.push(f64::from(lon));
            }

            let decoder = grib::Grib2SubmessageDecoder::from(submessage)
                .map_err(|e| WindError::Decode(format!("cannot decode submessage: {e}")))?;
            let values: Vec<f32> = decoder
                .dispatch()
                .map_err(|e| WindError::Decode(format!("cannot unpack values: {e}")))?
                .collect();

            if values.len() != lats.len() {
                return Err(WindError::Decode(format!(
                    "value count {} does not match {} grid points",
                    values.len(),
                    lats.len()
                )));
            }

            let plane = ComponentPlane {
                surface_type,
                surface_value,
                lats,
                lons,
                values,
            };
            match component {
                WindComponent::U => u_planes.push(plane),
                WindComponent::V => v_planes.push(plane),
            }
        }

        if u_planes.is_empty() || v_planes.is_empty() {
            return Err(WindError::MissingVariable(format!(
                "u/v wind pair not found (u planes: {}, v planes: {})",
                u_planes.len(),
                v_planes.len()
            )));
        }
        if u_planes.len() != v_planes.len() {
            return Err(WindError::Decode(format!(
                "unpaired wind planes: {} u vs {} v",
                u_planes.len(),
                v_planes.len()
            )));
        }

        // Pair v planes to u planes by fixed surface so both components
        // stack in the same vertical order.
        let mut v_remaining = v_planes;
        let mut ordered_v: Vec<ComponentPlane> = Vec::with_capacity(u_planes.len());
        for u_plane in &u_planes {
            let position = v_remaining.iter().position(|v| {
                v.surface_type == u_plane.surface_type
                    && surfaces_match(v.surface_value, u_plane.surface_value)
            });
            match position {
                Some(found) => ordered_v.push(v_remaining.swap_remove(found)),
                None => {
                    return Err(WindError::Decode(format!(
                        "no v component for surface {:?}/{}",
                        u_plane.surface_type, u_plane.surface_value
                    )))
                }
            }
        }

        let first = &u_planes[0];
        let cols = leading_row_length(&first.lats);
        if cols == 0 || first.lats.len() % cols != 0 {
            return Err(WindError::Decode(format!(
                "grid of {} points is not rectangular (row length {cols})",
                first.lats.len()
            )));
        }
        let rows = first.lats.len() / cols;
        debug!(
            rows,
            cols,
            planes = u_planes.len(),
            "Decoded wind field geometry"
        );

        let axes = GridAxes::Mesh {
            lats: first.lats.clone(),
            lons: first.lons.clone(),
            rows,
            cols,
        };
        let vertical = Self::vertical_axis(&u_planes);

        let mut u = Vec::with_capacity(first.values.len() * u_planes.len());
        let mut v = Vec::with_capacity(first.values.len() * u_planes.len());
        for plane in &u_planes {
            u.extend_from_slice(&plane.values);
        }
        for plane in &ordered_v {
            v.extend_from_slice(&plane.values);
        }

        WindField::new(axes, vertical, u, v)
    }
}

/// Fixed-surface values are decoded from scaled integers; equality with a
/// small absolute tolerance pairs them reliably.
fn surfaces_match(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    (a - b).abs() < 1e-6
}

/// Number of leading points sharing the first point's latitude: the
/// column count of a row-major rectangular lat/lon scan.
fn leading_row_length(lats: &[f64]) -> usize {
    match lats.first() {
        None => 0,
        Some(first) => lats.iter().take_while(|lat| *lat == first).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_parameter_number() {
        assert_eq!(
            GribWindDecoder::classify(0, 2, 2),
            Some(WindComponent::U)
        );
        assert_eq!(
            GribWindDecoder::classify(0, 2, 3),
            Some(WindComponent::V)
        );
        assert_eq!(GribWindDecoder::classify(0, 2, 1), None); // wind speed
        assert_eq!(GribWindDecoder::classify(0, 0, 0), None); // temperature
        assert_eq!(GribWindDecoder::classify(2, 2, 2), None); // land discipline
    }

    #[test]
    fn test_leading_row_length() {
        let lats = vec![10.0, 10.0, 10.0, 9.75, 9.75, 9.75];
        assert_eq!(leading_row_length(&lats), 3);
        assert_eq!(leading_row_length(&[]), 0);
        // A single-row grid is all one latitude.
        assert_eq!(leading_row_length(&[5.0, 5.0]), 2);
    }

    #[test]
    fn test_vertical_axis_from_surfaces() {
        let plane = |surface_type: Option<u8>, value: f64| ComponentPlane {
            surface_type,
            surface_value: value,
            lats: vec![],
            lons: vec![],
            values: vec![],
        };

        let heights = [plane(Some(SURFACE_HEIGHT_ABOVE_GROUND), 10.0)];
        assert_eq!(
            GribWindDecoder::vertical_axis(&heights),
            VerticalAxis::HeightMeters(vec![10.0])
        );

        let pressures = [
            plane(Some(SURFACE_ISOBARIC), 90_000.0),
            plane(Some(SURFACE_ISOBARIC), 40_000.0),
        ];
        assert_eq!(
            GribWindDecoder::vertical_axis(&pressures),
            VerticalAxis::PressureHpa(vec![900.0, 400.0])
        );

        let anonymous = [plane(None, f64::NAN)];
        assert_eq!(
            GribWindDecoder::vertical_axis(&anonymous),
            VerticalAxis::None
        );
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let result = GribWindDecoder.decode(b"not a grib file");
        assert!(matches!(result, Err(WindError::Decode(_))));
    }

    #[test]
    fn test_surfaces_match_tolerance() {
        assert!(surfaces_match(90_000.0, 90_000.0));
        assert!(surfaces_match(f64::NAN, f64::NAN));
        assert!(!surfaces_match(90_000.0, 40_000.0));
    }
}
