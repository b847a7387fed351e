//! Terrain classification: weighted terrain ranges blended into surface colors,
//! planet height sources, and bulk surface map generation.

mod color;
mod height;
mod range;
mod surface_map;

pub mod palette;

pub use color::{Color, ColorMixer};
pub use height::{ConstantHeightSource, HeightDataSource, NoiseHeightSource};
pub use palette::{
    AlienBiome, Biome, CoverageDomain, EarthLikeBiome, MarsLikeBiome, PaletteError, PointColor,
    RonBiome, TerrainPalette, biome_for,
};
pub use range::{
    GaussianAxis, GaussianRangeDef, GaussianTerrainRange, TEMPERATURE_OFFSET, TerrainRange,
    UNBOUNDED, UniformTerrainRange,
};
pub use surface_map::{MapError, SurfaceMaps};
