//! Atmospheric level specifications.

use serde::{Deserialize, Serialize};

use crate::error::{WindError, WindResult};

/// The kind of vertical surface a level refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelKind {
    /// Wind at 10 m above ground.
    #[serde(rename = "surface-10m")]
    Surface10m,
    /// Wind on an isobaric surface.
    #[serde(rename = "isobaric")]
    Isobaric,
}

/// One configured atmospheric level.
///
/// The key is a stable identifier used for artifact naming ("10m",
/// "850hPa"); the core treats it as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub key: String,
    pub kind: LevelKind,
    /// Pressure in hPa, present only for isobaric levels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_hpa: Option<f64>,
}

impl LevelSpec {
    pub fn surface_10m(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: LevelKind::Surface10m,
            pressure_hpa: None,
        }
    }

    pub fn isobaric(key: impl Into<String>, pressure_hpa: f64) -> Self {
        Self {
            key: key.into(),
            kind: LevelKind::Isobaric,
            pressure_hpa: Some(pressure_hpa),
        }
    }

    /// Check internal consistency of the spec.
    pub fn validate(&self) -> WindResult<()> {
        if self.key.is_empty() {
            return Err(WindError::InvalidLevel {
                key: self.key.clone(),
                message: "empty level key".to_string(),
            });
        }
        match (self.kind, self.pressure_hpa) {
            (LevelKind::Isobaric, None) => Err(WindError::InvalidLevel {
                key: self.key.clone(),
                message: "isobaric level without pressure_hpa".to_string(),
            }),
            (LevelKind::Isobaric, Some(p)) if !p.is_finite() || p <= 0.0 => {
                Err(WindError::InvalidLevel {
                    key: self.key.clone(),
                    message: format!("pressure_hpa must be positive, got {p}"),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isobaric_requires_pressure() {
        let mut level = LevelSpec::isobaric("850hPa", 850.0);
        assert!(level.validate().is_ok());

        level.pressure_hpa = None;
        assert!(level.validate().is_err());
    }

    #[test]
    fn test_surface_level_needs_no_pressure() {
        assert!(LevelSpec::surface_10m("10m").validate().is_ok());
    }

    #[test]
    fn test_kind_serde_tags() {
        let level: LevelSpec =
            serde_json::from_value(serde_json::json!({"key": "10m", "kind": "surface-10m"}))
                .unwrap();
        assert_eq!(level.kind, LevelKind::Surface10m);

        let level: LevelSpec = serde_json::from_value(
            serde_json::json!({"key": "400hPa", "kind": "isobaric", "pressure_hpa": 400.0}),
        )
        .unwrap();
        assert_eq!(level.kind, LevelKind::Isobaric);
        assert_eq!(level.pressure_hpa, Some(400.0));
    }
}
