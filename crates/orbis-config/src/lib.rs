//! Configuration for Orbis planets and the tools that generate them.
//!
//! Provides the immutable [`PlanetParameters`] shared by terrain classification and
//! collision geometry, plus runtime settings that persist to disk as RON files.
//! Supports CLI overrides via clap, hot-reload detection, and forward/backward
//! compatible serialization.

mod cli;
mod config;
mod error;
mod planet;

pub use cli::CliArgs;
pub use config::{BiomeKind, CONFIG_FILE, Config, DebugConfig, ParallelConfig, SurfaceMapConfig};
pub use error::ConfigError;
pub use planet::{AtmosphereParameters, PlanetParameters};
