//! Terrain palettes: a planet's set of terrain ranges and the blending that turns
//! them into a terrain color and a specular color per surface point.

mod biomes;

pub use biomes::{AlienBiome, Biome, EarthLikeBiome, MarsLikeBiome, RonBiome, biome_for};

use orbis_config::{PlanetParameters, SurfaceMapConfig};
use tracing::{debug, info};

use crate::range::TEMPERATURE_OFFSET;
use crate::{Color, ColorMixer, TerrainRange};

/// Errors raised while building or querying a palette.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaletteError {
    /// The biome registered no ranges.
    #[error("biome {0:?} registered no terrain ranges")]
    Empty(String),

    /// A range can produce weights outside `[0, 1]`.
    #[error("terrain range {index} ({name}) is invalid: {reason}")]
    InvalidRange {
        index: usize,
        name: String,
        reason: String,
    },

    /// Every range weighed zero at this point, so no color is defined.
    #[error(
        "no terrain range covers height {height}, slope {slope}, temperature {temperature} at ({x}, {y})"
    )]
    NoCoverage {
        x: i32,
        y: i32,
        height: f64,
        slope: f64,
        temperature: f64,
    },
}

/// Terrain and specular color of one surface point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointColor {
    pub terrain: Color,
    pub specular: Color,
}

/// An immutable set of terrain ranges for one planet.
///
/// Built once from a [`Biome`], then shared read-only by any number of threads.
/// Concurrent callers pass their own [`ColorMixer`] to
/// [`point_color_with`](Self::point_color_with).
#[derive(Clone, Debug)]
pub struct TerrainPalette {
    biome: String,
    params: PlanetParameters,
    ranges: Vec<TerrainRange>,
}

impl TerrainPalette {
    /// Runs the biome's `init_palette` for `params` and validates the result.
    ///
    /// # Errors
    ///
    /// [`PaletteError::Empty`] if no ranges were registered and
    /// [`PaletteError::InvalidRange`] if a range could produce a weight outside
    /// `[0, 1]`.
    pub fn new(params: &PlanetParameters, biome: &dyn Biome) -> Result<Self, PaletteError> {
        let ranges = biome.init_palette(params);
        Self::from_ranges(biome.name(), params, ranges)
    }

    /// Builds a palette from an explicit range list.
    pub fn from_ranges(
        biome: &str,
        params: &PlanetParameters,
        ranges: Vec<TerrainRange>,
    ) -> Result<Self, PaletteError> {
        if ranges.is_empty() {
            return Err(PaletteError::Empty(biome.to_string()));
        }
        for (index, range) in ranges.iter().enumerate() {
            range
                .validate()
                .map_err(|reason| PaletteError::InvalidRange {
                    index,
                    name: range.name().unwrap_or("unnamed").to_string(),
                    reason,
                })?;
        }

        info!(biome, ranges = ranges.len(), "Initialized terrain palette");
        Ok(Self {
            biome: biome.to_string(),
            params: params.clone(),
            ranges,
        })
    }

    pub fn biome(&self) -> &str {
        &self.biome
    }

    pub fn params(&self) -> &PlanetParameters {
        &self.params
    }

    pub fn ranges(&self) -> &[TerrainRange] {
        &self.ranges
    }

    /// Classifies a point using a temporary mixer.
    pub fn point_color(
        &self,
        x: i32,
        y: i32,
        height: f64,
        slope: f64,
        temperature: f64,
    ) -> Result<PointColor, PaletteError> {
        let mut mixer = ColorMixer::with_capacity(self.ranges.len());
        self.point_color_with(&mut mixer, x, y, height, slope, temperature)
    }

    /// Classifies a point using the caller's mixer.
    ///
    /// Each range is weighed once; the terrain pass and the specular pass share
    /// those weights. `temperature` is in the internal scale (configured
    /// temperature plus [`TEMPERATURE_OFFSET`]).
    ///
    /// # Errors
    ///
    /// [`PaletteError::NoCoverage`] when every range weighs zero at this point.
    pub fn point_color_with(
        &self,
        mixer: &mut ColorMixer,
        x: i32,
        y: i32,
        height: f64,
        slope: f64,
        temperature: f64,
    ) -> Result<PointColor, PaletteError> {
        mixer.clear();
        for range in &self.ranges {
            let weight = range.factor(x, y, height, slope, temperature);
            mixer.attach_color(range.terrain_color(), weight);
        }

        let no_coverage = || PaletteError::NoCoverage {
            x,
            y,
            height,
            slope,
            temperature,
        };
        let terrain = mixer.mixed_color().ok_or_else(no_coverage)?;

        mixer.recolor(self.ranges.iter().map(TerrainRange::specular_color));
        let specular = mixer.mixed_color().ok_or_else(no_coverage)?;

        Ok(PointColor { terrain, specular })
    }

    /// Samples `steps` values per axis over `domain` and fails on the first point
    /// no range covers.
    pub fn check_coverage(&self, domain: &CoverageDomain, steps: usize) -> Result<(), PaletteError> {
        let steps = steps.max(2);
        let at = |(lo, hi): (f64, f64), i: usize| lo + (hi - lo) * i as f64 / (steps - 1) as f64;
        let mut mixer = ColorMixer::with_capacity(self.ranges.len());

        for hi in 0..steps {
            let height = at(domain.height, hi);
            for si in 0..steps {
                let slope = at(domain.slope, si);
                for ti in 0..steps {
                    let temperature = at(domain.temperature, ti);
                    self.point_color_with(&mut mixer, 0, 0, height, slope, temperature)?;
                }
            }
        }

        debug!(biome = %self.biome, samples = steps.pow(3), "Palette covers its domain");
        Ok(())
    }
}

/// The height/slope/temperature box a palette is expected to cover.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverageDomain {
    /// Height range in height units.
    pub height: (f64, f64),
    /// Slope range in degrees.
    pub slope: (f64, f64),
    /// Temperature range in the internal scale.
    pub temperature: (f64, f64),
}

impl CoverageDomain {
    /// Everything a generated map of this planet can contain: heights within
    /// `±height_scale`, any slope, and temperatures between the configured pole and
    /// equator values, extended downwards by the lapse over the full height scale.
    pub fn for_planet(params: &PlanetParameters, map: &SurfaceMapConfig) -> Self {
        let coldest = map.pole_temperature.min(map.equator_temperature)
            - map.lapse_rate * (2.0 * params.height_scale.abs()) / 1000.0;
        let warmest = map.pole_temperature.max(map.equator_temperature);
        Self {
            height: (-params.height_scale.abs(), params.height_scale.abs()),
            slope: (0.0, 90.0),
            temperature: (coldest + TEMPERATURE_OFFSET, warmest + TEMPERATURE_OFFSET),
        }
    }
}
