//! In-memory wind vector fields produced by the decode collaborator.

use crate::error::{WindError, WindResult};

/// Longitude convention of a field's longitude axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LonConvention {
    /// Longitudes in -180..180.
    Signed,
    /// Longitudes in 0..360.
    Unsigned,
}

/// Horizontal grid geometry.
///
/// Decoders hand over either two independent 1-D axes or a pre-expanded
/// per-cell mesh; extraction sees both through the same row/column
/// accessors.
#[derive(Debug, Clone, PartialEq)]
pub enum GridAxes {
    /// Independent latitude and longitude axes; the grid is their product.
    Separable { lats: Vec<f64>, lons: Vec<f64> },
    /// Row-major per-cell coordinates. For rectangular lat/lon grids the
    /// first column carries the row latitudes and the first row the
    /// column longitudes.
    Mesh {
        lats: Vec<f64>,
        lons: Vec<f64>,
        rows: usize,
        cols: usize,
    },
}

impl GridAxes {
    pub fn rows(&self) -> usize {
        match self {
            GridAxes::Separable { lats, .. } => lats.len(),
            GridAxes::Mesh { rows, .. } => *rows,
        }
    }

    pub fn cols(&self) -> usize {
        match self {
            GridAxes::Separable { lons, .. } => lons.len(),
            GridAxes::Mesh { cols, .. } => *cols,
        }
    }

    /// Latitude of a grid row.
    pub fn lat_of_row(&self, row: usize) -> f64 {
        match self {
            GridAxes::Separable { lats, .. } => lats[row],
            GridAxes::Mesh { lats, cols, .. } => lats[row * cols],
        }
    }

    /// Longitude of a grid column.
    pub fn lon_of_col(&self, col: usize) -> f64 {
        match self {
            GridAxes::Separable { lons, .. } => lons[col],
            GridAxes::Mesh { lons, .. } => lons[col],
        }
    }

    /// Detect the longitude convention from the axis extent: an axis that
    /// never goes negative but exceeds 180 is 0..360.
    pub fn lon_convention(&self) -> LonConvention {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for col in 0..self.cols() {
            let lon = self.lon_of_col(col);
            min = min.min(lon);
            max = max.max(lon);
        }
        if min >= 0.0 && max > 180.0 {
            LonConvention::Unsigned
        } else {
            LonConvention::Signed
        }
    }

    fn cells(&self) -> usize {
        self.rows() * self.cols()
    }

    fn validate(&self) -> WindResult<()> {
        match self {
            GridAxes::Separable { lats, lons } => {
                if lats.is_empty() || lons.is_empty() {
                    return Err(WindError::Decode("empty lat/lon axis".to_string()));
                }
            }
            GridAxes::Mesh {
                lats,
                lons,
                rows,
                cols,
            } => {
                if *rows == 0 || *cols == 0 {
                    return Err(WindError::Decode("empty mesh".to_string()));
                }
                if lats.len() != rows * cols || lons.len() != rows * cols {
                    return Err(WindError::Decode(format!(
                        "mesh coordinates {}x{} do not match {rows}x{cols} shape",
                        lats.len(),
                        lons.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Vertical dimension carried by a field, if any.
///
/// Decoders collapse every other non-spatial dimension (ensemble member,
/// singleton time) to its first index before constructing the field.
#[derive(Debug, Clone, PartialEq)]
pub enum VerticalAxis {
    /// Single-plane field with no vertical dimension.
    None,
    /// Height above ground, metres.
    HeightMeters(Vec<f64>),
    /// Isobaric surfaces, hPa.
    PressureHpa(Vec<f64>),
}

impl VerticalAxis {
    /// Number of vertical planes the field stores.
    pub fn levels(&self) -> usize {
        match self {
            VerticalAxis::None => 1,
            VerticalAxis::HeightMeters(values) | VerticalAxis::PressureHpa(values) => values.len(),
        }
    }
}

/// A decoded u/v wind field on a rectangular lat/lon grid.
///
/// Component values are stored row-major per vertical plane, plane index
/// outermost.
#[derive(Debug, Clone)]
pub struct WindField {
    axes: GridAxes,
    vertical: VerticalAxis,
    u: Vec<f32>,
    v: Vec<f32>,
}

impl WindField {
    pub fn new(
        axes: GridAxes,
        vertical: VerticalAxis,
        u: Vec<f32>,
        v: Vec<f32>,
    ) -> WindResult<Self> {
        axes.validate()?;
        if vertical.levels() == 0 {
            return Err(WindError::Decode("empty vertical axis".to_string()));
        }
        let expected = axes.cells() * vertical.levels();
        if u.len() != expected || v.len() != expected {
            return Err(WindError::Decode(format!(
                "component lengths u={} v={} do not match {} grid cells",
                u.len(),
                v.len(),
                expected
            )));
        }
        Ok(Self {
            axes,
            vertical,
            u,
            v,
        })
    }

    pub fn axes(&self) -> &GridAxes {
        &self.axes
    }

    pub fn vertical(&self) -> &VerticalAxis {
        &self.vertical
    }

    /// Component values at one grid cell of one vertical plane.
    pub fn uv_at(&self, level: usize, row: usize, col: usize) -> (f32, f32) {
        let index = (level * self.axes.rows() + row) * self.axes.cols() + col;
        (self.u[index], self.v[index])
    }
}
