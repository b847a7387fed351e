//! Built-in biomes and RON-defined biomes.

use std::path::Path;

use orbis_config::{BiomeKind, ConfigError, PlanetParameters};
use serde::{Deserialize, Serialize};

use crate::{Color, GaussianAxis, GaussianTerrainRange, TerrainRange, UniformTerrainRange};

/// Height far beyond any terrain, used to make a uniform range span everything.
const FAR: f64 = 1.0e7;

/// A planet type, defined purely by the terrain ranges it registers.
pub trait Biome: Send + Sync {
    fn name(&self) -> &str;

    /// Registers the ranges for a planet with `params`.
    ///
    /// Implementations must cover every reachable point with some nonzero weight,
    /// typically with a low-weight range spanning all heights.
    fn init_palette(&self, params: &PlanetParameters) -> Vec<TerrainRange>;
}

/// Returns the built-in biome for `kind`.
pub fn biome_for(kind: BiomeKind) -> Box<dyn Biome> {
    match kind {
        BiomeKind::EarthLike => Box::new(EarthLikeBiome),
        BiomeKind::MarsLike => Box::new(MarsLikeBiome),
        BiomeKind::Alien => Box::new(AlienBiome),
    }
}

/// Oceans, beaches, grassland, forest, desert, rock and snow.
pub struct EarthLikeBiome;

impl Biome for EarthLikeBiome {
    fn name(&self) -> &str {
        "earth-like"
    }

    fn init_palette(&self, params: &PlanetParameters) -> Vec<TerrainRange> {
        let sea = f64::from(params.water_level);
        vec![
            UniformTerrainRange::new(-FAR, sea - 150.0, 1.0, Color::rgb(12, 34, 88), Color::gray(210))
                .named("deep ocean")
                .into(),
            GaussianTerrainRange::colored(Color::rgb(30, 92, 140), Color::gray(190))
                .named("shallows")
                .with_height(GaussianAxis::around(sea - 40.0, 60.0).at_most(sea))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(214, 200, 150), Color::gray(40))
                .named("beach")
                .with_height(GaussianAxis::around(sea + 10.0, 40.0).at_least(sea).at_most(sea + 120.0))
                .with_slope(GaussianAxis::around(0.0, 8.0).at_most(20.0))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(86, 140, 58), Color::gray(12))
                .named("grassland")
                .with_height(GaussianAxis::around(sea + 400.0, 900.0).at_least(sea).at_most(sea + 2500.0))
                .with_slope(GaussianAxis::around(4.0, 15.0).at_most(35.0))
                .with_temperature(GaussianAxis::around(16.0, 12.0).at_least(0.0))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(34, 82, 38), Color::gray(8))
                .named("forest")
                .with_height(
                    GaussianAxis::around(sea + 900.0, 700.0)
                        .at_least(sea + 50.0)
                        .at_most(sea + 3000.0),
                )
                .with_slope(GaussianAxis::around(12.0, 12.0).at_most(40.0))
                .with_temperature(GaussianAxis::around(10.0, 8.0).at_least(-5.0).at_most(30.0))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(222, 184, 120), Color::gray(30))
                .named("desert")
                .with_height(GaussianAxis::around(sea + 300.0, 800.0).at_least(sea).at_most(sea + 2000.0))
                .with_slope(GaussianAxis::around(2.0, 10.0).at_most(25.0))
                .with_temperature(GaussianAxis::around(32.0, 5.0).at_least(22.0))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(110, 102, 96), Color::gray(60))
                .named("rock")
                .with_height(GaussianAxis::FREE.at_least(sea))
                .with_slope(GaussianAxis::around(55.0, 20.0).at_least(20.0))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(244, 246, 250), Color::gray(150))
                .named("snow")
                .with_height(GaussianAxis::FREE.at_least(sea))
                .with_slope(GaussianAxis::around(0.0, 30.0).at_most(50.0))
                .with_temperature(GaussianAxis::around(-20.0, 10.0).at_most(2.0))
                .into(),
            UniformTerrainRange::new(-FAR, FAR, 0.02, Color::rgb(96, 88, 80), Color::gray(20))
                .named("bedrock")
                .into(),
        ]
    }
}

/// Rust-colored dust plains, dark basalt slopes, canyon floors and frosted poles.
pub struct MarsLikeBiome;

impl Biome for MarsLikeBiome {
    fn name(&self) -> &str {
        "mars-like"
    }

    fn init_palette(&self, params: &PlanetParameters) -> Vec<TerrainRange> {
        let floor = f64::from(params.water_level);
        vec![
            GaussianTerrainRange::colored(Color::rgb(120, 62, 40), Color::gray(10))
                .named("canyon floor")
                .with_height(GaussianAxis::around(floor, 2000.0).at_most(floor + 4000.0))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(193, 98, 52), Color::gray(15))
                .named("dust plains")
                .with_height(GaussianAxis::around(0.0, 3000.0))
                .with_slope(GaussianAxis::around(0.0, 10.0).at_most(25.0))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(214, 150, 90), Color::gray(20))
                .named("ochre highlands")
                .with_height(GaussianAxis::around(6000.0, 3000.0).at_least(2000.0))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(64, 48, 44), Color::gray(70))
                .named("basalt")
                .with_slope(GaussianAxis::around(45.0, 15.0).at_least(15.0))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(236, 230, 226), Color::gray(170))
                .named("polar frost")
                .with_temperature(GaussianAxis::around(-80.0, 15.0).at_most(-50.0))
                .into(),
            UniformTerrainRange::new(-FAR, FAR, 0.05, Color::rgb(150, 80, 50), Color::gray(10))
                .named("regolith")
                .into(),
        ]
    }
}

/// Violet lowlands, teal highlands, crystal peaks and acid seas.
pub struct AlienBiome;

impl Biome for AlienBiome {
    fn name(&self) -> &str {
        "alien"
    }

    fn init_palette(&self, params: &PlanetParameters) -> Vec<TerrainRange> {
        let sea = f64::from(params.water_level);
        vec![
            UniformTerrainRange::new(-FAR, sea, 1.0, Color::rgb(128, 200, 40), Color::gray(230))
                .named("acid sea")
                .into(),
            GaussianTerrainRange::colored(Color::rgb(112, 52, 140), Color::gray(25))
                .named("violet lowlands")
                .with_height(GaussianAxis::around(sea + 500.0, 1200.0).at_least(sea))
                .with_slope(GaussianAxis::around(5.0, 15.0).at_most(30.0))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(36, 150, 140), Color::gray(35))
                .named("teal highlands")
                .with_height(GaussianAxis::around(sea + 3500.0, 1500.0).at_least(sea + 1000.0))
                .with_temperature(GaussianAxis::around(5.0, 25.0))
                .into(),
            GaussianTerrainRange::colored(Color::rgb(220, 240, 255), Color::gray(255))
                .named("crystal spires")
                .with_height(GaussianAxis::FREE.at_least(sea + 3000.0))
                .with_slope(GaussianAxis::around(70.0, 20.0).at_least(30.0))
                .into(),
            UniformTerrainRange::new(-FAR, FAR, 0.03, Color::rgb(60, 40, 70), Color::gray(15))
                .named("substrate")
                .into(),
        ]
    }
}

/// A biome loaded from RON data instead of code.
///
/// Water-relative heights are not available to data-defined biomes; bounds are
/// absolute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RonBiome {
    pub name: String,
    pub ranges: Vec<TerrainRange>,
}

impl RonBiome {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(ConfigError::ParseError)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_ron(&text)
    }

    /// Serializes this biome to pretty RON.
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())
            .map_err(ConfigError::SerializeError)
    }

    /// Captures a built-in biome's ranges for `params` as editable data.
    pub fn snapshot(biome: &dyn Biome, params: &PlanetParameters) -> Self {
        Self {
            name: biome.name().to_string(),
            ranges: biome.init_palette(params),
        }
    }
}

impl Biome for RonBiome {
    fn name(&self) -> &str {
        &self.name
    }

    fn init_palette(&self, _params: &PlanetParameters) -> Vec<TerrainRange> {
        self.ranges.clone()
    }
}
