//! Planet parameters: the immutable description shared by terrain palettes and
//! collision geometry.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Immutable-after-construction parameters of a single planet.
///
/// Heights (`water_level`, terrain range bounds, sampled height offsets) are all
/// expressed in the same unit as `radius` (meters).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetParameters {
    /// Radius of the undisplaced base sphere in meters. Must be positive.
    pub radius: f64,
    /// Absolute sea level in height units. Points below it are under water.
    pub water_level: i32,
    /// Fraction of the surface covered by water, in `[0.0, 1.0]`.
    pub water_fraction: f64,
    /// Multiplier applied to raw `[-1, 1]` noise to obtain height offsets.
    pub height_scale: f64,
    /// Seed for all procedural generation on this planet.
    pub seed: u64,
    /// Length of one rotation in seconds.
    pub day_length: f64,
    /// Relative humidity in `[0.0, 1.0]`. Not consumed by terrain classification.
    pub humidity: f64,
    /// Atmosphere appearance.
    pub atmosphere: AtmosphereParameters,
    /// Cloud layer altitude as a fraction of the radius.
    pub cloud_height_fraction: f64,
    /// Terrain smoothness in `[0.0, 1.0]`; smoother terrain uses fewer noise octaves.
    pub terrain_smoothness: f64,
}

/// Atmosphere parameters used by renderers; carried here so a planet is fully
/// described by one value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtmosphereParameters {
    /// Density at sea level, relative to Earth.
    pub density: f64,
    /// Atmosphere thickness as a fraction of the radius.
    pub height_fraction: f64,
    /// Scattering tint as 8-bit RGB.
    pub color: [u8; 3],
}

impl Default for AtmosphereParameters {
    fn default() -> Self {
        Self {
            density: 1.0,
            height_fraction: 0.025,
            color: [110, 160, 255],
        }
    }
}

impl Default for PlanetParameters {
    fn default() -> Self {
        Self::earth_like(0)
    }
}

impl PlanetParameters {
    /// Earth-like planet preset (radius 6,371 km, sea level at zero).
    pub fn earth_like(seed: u64) -> Self {
        Self {
            radius: 6_371_000.0,
            water_level: 0,
            water_fraction: 0.7,
            height_scale: 8_000.0,
            seed,
            day_length: 86_400.0,
            humidity: 0.6,
            atmosphere: AtmosphereParameters::default(),
            cloud_height_fraction: 0.0015,
            terrain_smoothness: 0.5,
        }
    }

    /// Mars-like planet preset (radius 3,389.5 km, thin dusty atmosphere, dry).
    pub fn mars_like(seed: u64) -> Self {
        Self {
            radius: 3_389_500.0,
            water_level: -9_000,
            water_fraction: 0.0,
            height_scale: 12_000.0,
            seed,
            day_length: 88_775.0,
            humidity: 0.0,
            atmosphere: AtmosphereParameters {
                density: 0.01,
                height_fraction: 0.0033,
                color: [210, 150, 110],
            },
            cloud_height_fraction: 0.0,
            terrain_smoothness: 0.35,
        }
    }

    /// Alien planet preset: small, rough, shallow seas.
    pub fn alien(seed: u64) -> Self {
        Self {
            radius: 2_000_000.0,
            water_level: -1_500,
            water_fraction: 0.3,
            height_scale: 6_000.0,
            seed,
            day_length: 51_000.0,
            humidity: 0.8,
            atmosphere: AtmosphereParameters {
                density: 2.4,
                height_fraction: 0.04,
                color: [150, 230, 140],
            },
            cloud_height_fraction: 0.004,
            terrain_smoothness: 0.2,
        }
    }

    /// Checks the invariants consumers rely on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a non-positive or non-finite radius,
    /// a non-finite height scale, or fractions outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::Invalid {
                field: "radius",
                reason: format!("must be positive and finite, got {}", self.radius),
            });
        }
        if !self.height_scale.is_finite() {
            return Err(ConfigError::Invalid {
                field: "height_scale",
                reason: format!("must be finite, got {}", self.height_scale),
            });
        }
        for (field, value) in [
            ("water_fraction", self.water_fraction),
            ("humidity", self.humidity),
            ("terrain_smoothness", self.terrain_smoothness),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must lie in [0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Altitude of the cloud layer above the base sphere, in meters.
    pub fn cloud_altitude(&self) -> f64 {
        self.radius * self.cloud_height_fraction
    }

    /// Outer radius of the atmosphere shell, in meters.
    pub fn atmosphere_radius(&self) -> f64 {
        self.radius * (1.0 + self.atmosphere.height_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for params in [
            PlanetParameters::earth_like(1),
            PlanetParameters::mars_like(2),
            PlanetParameters::alien(3),
        ] {
            params.validate().unwrap();
        }
    }

    #[test]
    fn test_zero_radius_rejected() {
        let params = PlanetParameters {
            radius: 0.0,
            ..PlanetParameters::default()
        };
        let err = params.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "radius", .. }));
    }

    #[test]
    fn test_nan_radius_rejected() {
        let params = PlanetParameters {
            radius: f64::NAN,
            ..PlanetParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_fraction_out_of_range_rejected() {
        let params = PlanetParameters {
            water_fraction: 1.5,
            ..PlanetParameters::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("water_fraction"));
    }

    #[test]
    fn test_derived_altitudes() {
        let params = PlanetParameters::earth_like(0);
        assert!((params.cloud_altitude() - 6_371_000.0 * 0.0015).abs() < 1e-6);
        assert!(params.atmosphere_radius() > params.radius);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let params: PlanetParameters = ron::from_str("(seed: 9, radius: 1000.0)").unwrap();
        assert_eq!(params.seed, 9);
        assert_eq!(params.radius, 1000.0);
        assert_eq!(params.atmosphere, AtmosphereParameters::default());
    }
}
