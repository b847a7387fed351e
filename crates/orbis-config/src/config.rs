//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::planet::PlanetParameters;

/// Top-level configuration for planet generation tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The planet being generated.
    pub planet: PlanetParameters,
    /// Which terrain palette to classify the surface with.
    pub biome: BiomeKind,
    /// Parallel execution settings.
    pub parallel: ParallelConfig,
    /// Surface map generation settings.
    pub map: SurfaceMapConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Built-in terrain palettes.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
pub enum BiomeKind {
    /// Oceans, beaches, grassland, rock and snow caps.
    #[default]
    EarthLike,
    /// Rust-colored dust plains, dark basalt slopes and frosted poles.
    MarsLike,
    /// Violet lowlands and teal highlands.
    Alien,
}

impl BiomeKind {
    /// The planet preset that matches this palette.
    pub fn planet_preset(self, seed: u64) -> PlanetParameters {
        match self {
            BiomeKind::EarthLike => PlanetParameters::earth_like(seed),
            BiomeKind::MarsLike => PlanetParameters::mars_like(seed),
            BiomeKind::Alien => PlanetParameters::alien(seed),
        }
    }
}

/// Parallel-for execution settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParallelConfig {
    /// When `false`, every parallel loop runs sequentially on the calling thread.
    pub multicore: bool,
    /// Overrides the detected hardware parallelism. `None` uses every core.
    pub threads: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            multicore: true,
            threads: None,
        }
    }
}

/// Settings for equirectangular surface map generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurfaceMapConfig {
    /// Map width in texels (longitude).
    pub width: u32,
    /// Map height in texels (latitude).
    pub height: u32,
    /// Surface temperature at the equator and sea level, in degrees Celsius.
    pub equator_temperature: f64,
    /// Surface temperature at the poles and sea level, in degrees Celsius.
    pub pole_temperature: f64,
    /// Temperature drop per 1000 height units above sea level.
    pub lapse_rate: f64,
}

impl Default for SurfaceMapConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 256,
            equator_temperature: 30.0,
            pole_temperature: -35.0,
            lapse_rate: 6.5,
        }
    }
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write a JSON log file next to the generated maps.
    pub log_to_file: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

/// File name of the persisted configuration inside a config directory.
pub const CONFIG_FILE: &str = "config.ron";

impl Config {
    /// Reads `config.ron` from `config_dir`, writing the defaults there first when
    /// the file does not exist yet.
    ///
    /// # Errors
    ///
    /// I/O and RON errors, and [`ConfigError::Invalid`] when the stored planet
    /// fails [`PlanetParameters::validate`].
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        if !path.exists() {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Wrote default planet config to {}", path.display());
            return Ok(config);
        }

        let config = Self::read_validated(&path)?;
        log::info!(
            "Loaded {:?} planet (seed {}) from {}",
            config.biome,
            config.planet.seed,
            path.display()
        );
        Ok(config)
    }

    /// Default config directory (`<platform config dir>/orbis`), if the platform has one.
    pub fn default_dir() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|dir| dir.join("orbis"))
    }

    /// Writes this config to `config_dir/config.ron`, creating the directory.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;
        let text = ron::ser::to_string_pretty(self, Self::ron_style())
            .map_err(ConfigError::SerializeError)?;
        std::fs::write(config_dir.join(CONFIG_FILE), text).map_err(ConfigError::WriteError)
    }

    /// Re-reads `config.ron` and returns it only if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read_validated(&config_dir.join(CONFIG_FILE))?;
        if fresh == *self {
            return Ok(None);
        }
        log::info!("Planet config changed on disk");
        Ok(Some(fresh))
    }

    fn read_validated(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = ron::from_str(&text).map_err(ConfigError::ParseError)?;
        config.planet.validate()?;
        Ok(config)
    }

    /// Nested sections stay on their own lines; the atmosphere color stays inline.
    fn ron_style() -> ron::ser::PrettyConfig {
        ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false)
    }
}
