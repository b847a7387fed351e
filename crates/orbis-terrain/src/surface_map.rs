//! Equirectangular height, color and specular maps of a whole planet.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use glam::DVec3;
use orbis_config::SurfaceMapConfig;
use orbis_parallel::{ParallelError, ParallelForExecutor, ParallelTask};
use tracing::{info, instrument, warn};

use crate::palette::{PaletteError, TerrainPalette};
use crate::range::TEMPERATURE_OFFSET;
use crate::{Color, ColorMixer, HeightDataSource};

/// Errors raised while generating or exporting surface maps.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("classification failed: {0}")]
    Palette(#[from] PaletteError),

    #[error("parallel generation failed: {0}")]
    Parallel(#[from] ParallelError),

    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to create output directory: {0}")]
    Io(#[from] std::io::Error),

    /// The map has no texels.
    #[error("map size {width}x{height} has no texels")]
    EmptyMap { width: u32, height: u32 },
}

/// Texel-to-sphere mapping shared by both generation passes.
#[derive(Clone, Copy, Debug)]
struct TexelGrid {
    width: u32,
    height: u32,
}

impl TexelGrid {
    fn len(self) -> usize {
        self.width as usize * self.height as usize
    }

    fn coords(self, index: usize) -> (u32, u32) {
        let w = self.width as usize;
        ((index % w) as u32, (index / w) as u32)
    }

    fn index(self, u: u32, v: u32) -> usize {
        v as usize * self.width as usize + u as usize
    }

    /// Latitude of row `v`'s center, `+π/2` at the top.
    fn latitude(self, v: u32) -> f64 {
        FRAC_PI_2 - (f64::from(v) + 0.5) / f64::from(self.height) * PI
    }

    fn longitude(self, u: u32) -> f64 {
        (f64::from(u) + 0.5) / f64::from(self.width) * TAU - PI
    }

    /// Unit direction through the texel center; `+Y` is north.
    fn direction(self, u: u32, v: u32) -> DVec3 {
        let (sin_lat, cos_lat) = self.latitude(v).sin_cos();
        let (sin_lon, cos_lon) = self.longitude(u).sin_cos();
        DVec3::new(cos_lat * cos_lon, sin_lat, cos_lat * sin_lon)
    }
}

/// First pass: one height per texel, stored as `f64` bits.
#[derive(Clone, Copy)]
struct HeightTask<'a> {
    grid: TexelGrid,
    source: &'a dyn HeightDataSource,
    heights: &'a [AtomicU64],
}

impl ParallelTask for HeightTask<'_> {
    fn run(&mut self, index: usize) {
        let (u, v) = self.grid.coords(index);
        let h = self.source.height(self.grid.direction(u, v));
        self.heights[index].store(h.to_bits(), Ordering::Relaxed);
    }

    fn copy(&self) -> Self {
        *self
    }
}

/// Second pass: slope and temperature from the height field, then blending.
struct ClassifyTask<'a> {
    grid: TexelGrid,
    palette: &'a TerrainPalette,
    config: &'a SurfaceMapConfig,
    heights: &'a [f64],
    color: &'a [AtomicU32],
    specular: &'a [AtomicU32],
    first_error: &'a Mutex<Option<PaletteError>>,
    mixer: ColorMixer,
}

impl ClassifyTask<'_> {
    fn slope_degrees(&self, u: u32, v: u32) -> f64 {
        let grid = self.grid;
        let radius = self.palette.params().radius;
        let lat = grid.latitude(v);

        let west = grid.index((u + grid.width - 1) % grid.width, v);
        let east = grid.index((u + 1) % grid.width, v);
        let dx = (radius * lat.cos() * TAU / f64::from(grid.width)).max(1.0);
        let dh_dx = (self.heights[east] - self.heights[west]) / (2.0 * dx);

        let north_v = v.saturating_sub(1);
        let south_v = (v + 1).min(grid.height - 1);
        let rows = f64::from(south_v - north_v);
        let dh_dy = if rows > 0.0 {
            let dy = radius * PI / f64::from(grid.height);
            (self.heights[grid.index(u, north_v)] - self.heights[grid.index(u, south_v)])
                / (rows * dy)
        } else {
            0.0
        };

        dh_dx.hypot(dh_dy).atan().to_degrees()
    }

    fn temperature(&self, v: u32, height: f64) -> f64 {
        let config = self.config;
        let params = self.palette.params();
        let altitude = (height - f64::from(params.water_level)).max(0.0);
        config.pole_temperature
            + (config.equator_temperature - config.pole_temperature) * self.grid.latitude(v).cos()
            - config.lapse_rate * altitude / 1000.0
            + TEMPERATURE_OFFSET
    }
}

impl ParallelTask for ClassifyTask<'_> {
    fn run(&mut self, index: usize) {
        let (u, v) = self.grid.coords(index);
        let height = self.heights[index];
        let slope = self.slope_degrees(u, v);
        let temperature = self.temperature(v, height);

        match self.palette.point_color_with(
            &mut self.mixer,
            u as i32,
            v as i32,
            height,
            slope,
            temperature,
        ) {
            Ok(point) => {
                self.color[index].store(point.terrain.to_packed(), Ordering::Relaxed);
                self.specular[index].store(point.specular.to_packed(), Ordering::Relaxed);
            }
            Err(err) => {
                if let Ok(mut slot) = self.first_error.lock()
                    && slot.is_none()
                {
                    *slot = Some(err);
                }
            }
        }
    }

    fn copy(&self) -> Self {
        Self {
            mixer: ColorMixer::with_capacity(self.palette.ranges().len()),
            ..*self
        }
    }
}

/// Generated maps, row-major from the north-west corner.
#[derive(Clone, Debug)]
pub struct SurfaceMaps {
    width: u32,
    height: u32,
    height_scale: f64,
    heights: Vec<f64>,
    color: Vec<Color>,
    specular: Vec<Color>,
}

impl SurfaceMaps {
    /// Samples `source` over the whole sphere and classifies every texel with
    /// `palette`.
    ///
    /// # Errors
    ///
    /// [`MapError::Palette`] with the first uncovered texel found, or
    /// [`MapError::Parallel`] if a worker failed.
    #[instrument(skip_all, fields(biome = palette.biome(), width = config.width, height = config.height))]
    pub fn generate(
        palette: &TerrainPalette,
        source: &dyn HeightDataSource,
        config: &SurfaceMapConfig,
        executor: &ParallelForExecutor,
    ) -> Result<Self, MapError> {
        let grid = TexelGrid {
            width: config.width,
            height: config.height,
        };
        if grid.len() == 0 {
            return Err(MapError::EmptyMap {
                width: config.width,
                height: config.height,
            });
        }

        let height_bits: Vec<AtomicU64> = (0..grid.len()).map(|_| AtomicU64::new(0)).collect();
        let mut heights_task = HeightTask {
            grid,
            source,
            heights: &height_bits,
        };
        executor.parallel_for(0, grid.len(), &mut heights_task)?;
        let heights: Vec<f64> = height_bits
            .into_iter()
            .map(|bits| f64::from_bits(bits.into_inner()))
            .collect();

        let color: Vec<AtomicU32> = (0..grid.len()).map(|_| AtomicU32::new(0)).collect();
        let specular: Vec<AtomicU32> = (0..grid.len()).map(|_| AtomicU32::new(0)).collect();
        let first_error = Mutex::new(None);
        let mut classify = ClassifyTask {
            grid,
            palette,
            config,
            heights: &heights,
            color: &color,
            specular: &specular,
            first_error: &first_error,
            mixer: ColorMixer::with_capacity(palette.ranges().len()),
        };
        executor.parallel_for(0, grid.len(), &mut classify)?;

        if let Some(err) = first_error.into_inner().ok().flatten() {
            warn!(%err, "Surface classification left texels uncovered");
            return Err(err.into());
        }

        let unpack = |buf: Vec<AtomicU32>| -> Vec<Color> {
            buf.into_iter()
                .map(|c| Color::from_packed(c.into_inner()))
                .collect()
        };
        let maps = Self {
            width: grid.width,
            height: grid.height,
            height_scale: palette.params().height_scale,
            heights,
            color: unpack(color),
            specular: unpack(specular),
        };
        info!(
            texels = grid.len(),
            min_height = maps.min_height(),
            max_height = maps.max_height(),
            "Generated surface maps"
        );
        Ok(maps)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn color(&self) -> &[Color] {
        &self.color
    }

    pub fn specular(&self) -> &[Color] {
        &self.specular
    }

    /// Height at texel `(u, v)`. Panics when out of range.
    pub fn height_at(&self, u: u32, v: u32) -> f64 {
        self.heights[v as usize * self.width as usize + u as usize]
    }

    pub fn color_at(&self, u: u32, v: u32) -> Color {
        self.color[v as usize * self.width as usize + u as usize]
    }

    pub fn min_height(&self) -> f64 {
        self.heights.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_height(&self) -> f64 {
        self.heights.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Writes `color.png`, `specular.png` and `height.png` into `dir`, creating it
    /// if needed. Heights map `±height_scale` onto the full gray range.
    pub fn save_png(&self, dir: &Path) -> Result<(), MapError> {
        std::fs::create_dir_all(dir)?;

        let rgb = |colors: &[Color]| -> image::RgbImage {
            image::RgbImage::from_fn(self.width, self.height, |u, v| {
                image::Rgb(colors[v as usize * self.width as usize + u as usize].channels())
            })
        };
        rgb(&self.color).save(dir.join("color.png"))?;
        rgb(&self.specular).save(dir.join("specular.png"))?;

        let scale = if self.height_scale.abs() > 0.0 {
            self.height_scale.abs()
        } else {
            1.0
        };
        let gray = image::GrayImage::from_fn(self.width, self.height, |u, v| {
            let normalized = (self.height_at(u, v) / scale).clamp(-1.0, 1.0) * 0.5 + 0.5;
            image::Luma([(normalized * 255.0).round() as u8])
        });
        gray.save(dir.join("height.png"))?;

        info!(dir = %dir.display(), "Saved surface maps");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_config::PlanetParameters;
    use crate::{ConstantHeightSource, EarthLikeBiome, NoiseHeightSource, UniformTerrainRange};

    fn small_config() -> SurfaceMapConfig {
        SurfaceMapConfig {
            width: 48,
            height: 24,
            ..SurfaceMapConfig::default()
        }
    }

    #[test]
    fn test_texel_directions_are_unit_and_north_up() {
        let grid = TexelGrid {
            width: 16,
            height: 8,
        };
        for index in 0..grid.len() {
            let (u, v) = grid.coords(index);
            assert!((grid.direction(u, v).length() - 1.0).abs() < 1e-12);
        }
        assert!(grid.direction(0, 0).y > 0.9);
        assert!(grid.direction(0, 7).y < -0.9);
    }

    #[test]
    fn test_flat_planet_has_zero_slope_and_single_color() {
        let params = PlanetParameters::earth_like(1);
        let band = UniformTerrainRange::new(-10.0, 10.0, 1.0, Color::rgb(1, 2, 3), Color::gray(4));
        let palette = TerrainPalette::from_ranges("flat", &params, vec![band.into()]).unwrap();
        let maps = SurfaceMaps::generate(
            &palette,
            &ConstantHeightSource(0.0),
            &small_config(),
            &ParallelForExecutor::new(4, true),
        )
        .unwrap();
        assert!(maps.color().iter().all(|&c| c == Color::rgb(1, 2, 3)));
        assert!(maps.specular().iter().all(|&c| c == Color::gray(4)));
        assert_eq!(maps.min_height(), 0.0);
        assert_eq!(maps.max_height(), 0.0);
    }

    #[test]
    fn test_multicore_matches_sequential() {
        let params = PlanetParameters::earth_like(17);
        let palette = TerrainPalette::new(&params, &EarthLikeBiome).unwrap();
        let source = NoiseHeightSource::new(&params);
        let config = small_config();

        let parallel =
            SurfaceMaps::generate(&palette, &source, &config, &ParallelForExecutor::new(4, true))
                .unwrap();
        let sequential =
            SurfaceMaps::generate(&palette, &source, &config, &ParallelForExecutor::sequential())
                .unwrap();

        assert_eq!(parallel.heights(), sequential.heights());
        assert_eq!(parallel.color(), sequential.color());
        assert_eq!(parallel.specular(), sequential.specular());
    }

    #[test]
    fn test_uncovered_texel_is_reported() {
        let params = PlanetParameters::earth_like(1);
        let band = UniformTerrainRange::new(-10.0, 10.0, 1.0, Color::WHITE, Color::WHITE);
        let palette = TerrainPalette::from_ranges("narrow", &params, vec![band.into()]).unwrap();
        let err = SurfaceMaps::generate(
            &palette,
            &ConstantHeightSource(500.0),
            &small_config(),
            &ParallelForExecutor::new(3, true),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MapError::Palette(PaletteError::NoCoverage { height, .. }) if height == 500.0
        ));
    }

    #[test]
    fn test_empty_map_rejected() {
        let params = PlanetParameters::earth_like(1);
        let palette = TerrainPalette::new(&params, &EarthLikeBiome).unwrap();
        let config = SurfaceMapConfig {
            width: 0,
            ..small_config()
        };
        let err = SurfaceMaps::generate(
            &palette,
            &ConstantHeightSource(0.0),
            &config,
            &ParallelForExecutor::sequential(),
        )
        .unwrap_err();
        assert!(matches!(err, MapError::EmptyMap { width: 0, .. }));
    }

    #[test]
    fn test_save_png_writes_three_maps() {
        let params = PlanetParameters::alien(2);
        let palette = TerrainPalette::new(&params, &crate::AlienBiome).unwrap();
        let maps = SurfaceMaps::generate(
            &palette,
            &NoiseHeightSource::new(&params),
            &SurfaceMapConfig {
                width: 32,
                height: 16,
                ..SurfaceMapConfig::default()
            },
            &ParallelForExecutor::new(2, true),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("maps");
        maps.save_png(&out).unwrap();
        for name in ["color.png", "specular.png", "height.png"] {
            assert!(out.join(name).is_file(), "{name} missing");
        }
    }
}
