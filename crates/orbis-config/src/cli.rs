//! Command-line argument parsing for Orbis tools.

use std::path::PathBuf;

use clap::Parser;

use crate::{BiomeKind, Config};

/// Orbis command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "orbis", about = "Planet surface map and collision patch generator")]
pub struct CliArgs {
    /// Terrain palette. Also switches the planet to the matching preset.
    #[arg(long, value_enum)]
    pub biome: Option<BiomeKind>,

    /// Generation seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Planet radius in meters.
    #[arg(long)]
    pub radius: Option<f64>,

    /// Map width in texels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Map height in texels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Run every parallel loop on the calling thread.
    #[arg(long)]
    pub single_thread: bool,

    /// Worker thread count override.
    #[arg(long)]
    pub threads: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the generated maps are written to.
    #[arg(long, default_value = "out")]
    pub output: PathBuf,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    ///
    /// `--biome` is applied first so that explicit `--seed`/`--radius` values win
    /// over the preset it selects.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(biome) = args.biome {
            self.biome = biome;
            self.planet = biome.planet_preset(self.planet.seed);
        }
        if let Some(seed) = args.seed {
            self.planet.seed = seed;
        }
        if let Some(radius) = args.radius {
            self.planet.radius = radius;
        }
        if let Some(w) = args.width {
            self.map.width = w;
        }
        if let Some(h) = args.height {
            self.map.height = h;
        }
        if args.single_thread {
            self.parallel.multicore = false;
        }
        if let Some(threads) = args.threads {
            self.parallel.threads = Some(threads);
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs::parse_from(["orbis"])
    }

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1024),
            seed: Some(99),
            single_thread: true,
            ..empty_args()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.map.width, 1024);
        assert_eq!(config.planet.seed, 99);
        assert!(!config.parallel.multicore);
        // Non-overridden fields retain defaults
        assert_eq!(config.map.height, 256);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&empty_args());
        assert_eq!(config, original);
    }

    #[test]
    fn test_biome_switches_preset_but_keeps_seed() {
        let mut config = Config::default();
        config.planet.seed = 5;
        let args = CliArgs::parse_from(["orbis", "--biome", "mars-like"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config.biome, BiomeKind::MarsLike);
        assert_eq!(config.planet, crate::PlanetParameters::mars_like(5));
    }

    #[test]
    fn test_explicit_radius_wins_over_preset() {
        let mut config = Config::default();
        let args = CliArgs::parse_from(["orbis", "--biome", "alien", "--radius", "500"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config.planet.radius, 500.0);
    }
}
