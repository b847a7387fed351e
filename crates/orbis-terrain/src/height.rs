//! Height sources: signed surface offsets sampled by direction from the planet center.

use glam::DVec3;
use noise::{NoiseFn, Simplex};
use orbis_config::PlanetParameters;

/// Supplies the terrain height offset for any direction from the planet center.
///
/// Implementations must be pure functions of the direction and safe to call from
/// many threads at once.
pub trait HeightDataSource: Send + Sync {
    /// Signed offset from the base radius for the unit vector `direction`.
    fn height(&self, direction: DVec3) -> f64;
}

/// The same offset everywhere: a perfect sphere of radius `radius + offset`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConstantHeightSource(pub f64);

impl HeightDataSource for ConstantHeightSource {
    fn height(&self, _direction: DVec3) -> f64 {
        self.0
    }
}

/// Fractal Brownian motion over 3D simplex noise sampled on the unit sphere.
///
/// Output is normalized to `[-1, 1]` by the octave amplitude sum, then scaled by
/// the planet's `height_scale`.
pub struct NoiseHeightSource {
    noise: Simplex,
    octaves: u32,
    base_frequency: f64,
    lacunarity: f64,
    persistence: f64,
    height_scale: f64,
    norm: f64,
}

impl NoiseHeightSource {
    /// Smoothest terrain uses this many octaves; roughest adds [`EXTRA_OCTAVES`].
    const MIN_OCTAVES: u32 = 3;
    const EXTRA_OCTAVES: f64 = 5.0;

    /// Derives the noise from the planet's seed, height scale and smoothness.
    pub fn new(params: &PlanetParameters) -> Self {
        let roughness = 1.0 - params.terrain_smoothness.clamp(0.0, 1.0);
        let octaves = Self::MIN_OCTAVES + (roughness * Self::EXTRA_OCTAVES).round() as u32;
        Self::with_octaves(params.seed, octaves, params.height_scale)
    }

    pub fn with_octaves(seed: u64, octaves: u32, height_scale: f64) -> Self {
        let octaves = octaves.max(1);
        let persistence: f64 = 0.5;
        let norm = (0..octaves).map(|i| persistence.powi(i as i32)).sum();
        Self {
            noise: Simplex::new(seed as u32),
            octaves,
            base_frequency: 1.5,
            lacunarity: 2.0,
            persistence,
            height_scale,
            norm,
        }
    }

    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    /// Largest absolute height this source can return.
    pub fn max_amplitude(&self) -> f64 {
        self.height_scale.abs()
    }
}

impl HeightDataSource for NoiseHeightSource {
    fn height(&self, direction: DVec3) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.base_frequency;
        let mut amplitude = 1.0;

        for _ in 0..self.octaves {
            let p = direction * frequency;
            total += self.noise.get([p.x, p.y, p.z]) * amplitude;

            frequency *= self.lacunarity;
            amplitude *= self.persistence;
        }

        (total / self.norm).clamp(-1.0, 1.0) * self.height_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_direction(rng: &mut ChaCha8Rng) -> DVec3 {
        DVec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        )
        .normalize_or(DVec3::Y)
    }

    #[test]
    fn test_determinism_same_seed_same_direction() {
        let params = PlanetParameters::earth_like(42);
        let a = NoiseHeightSource::new(&params);
        let b = NoiseHeightSource::new(&params);
        let dir = DVec3::new(0.3, 0.5, -0.8).normalize();
        assert_eq!(a.height(dir), b.height(dir));
    }

    #[test]
    fn test_different_seeds_produce_different_heights() {
        let a = NoiseHeightSource::new(&PlanetParameters::earth_like(1));
        let b = NoiseHeightSource::new(&PlanetParameters::earth_like(2));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let differs = (0..64)
            .map(|_| random_direction(&mut rng))
            .any(|d| (a.height(d) - b.height(d)).abs() > 1e-6);
        assert!(differs);
    }

    #[test]
    fn test_heights_bounded_by_scale() {
        let params = PlanetParameters::mars_like(7);
        let source = NoiseHeightSource::new(&params);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..5_000 {
            let h = source.height(random_direction(&mut rng));
            assert!(h.is_finite());
            assert!(h.abs() <= source.max_amplitude(), "{h}");
        }
    }

    #[test]
    fn test_smoothness_controls_octaves() {
        let mut params = PlanetParameters::earth_like(0);
        params.terrain_smoothness = 1.0;
        assert_eq!(NoiseHeightSource::new(&params).octaves(), 3);
        params.terrain_smoothness = 0.0;
        assert_eq!(NoiseHeightSource::new(&params).octaves(), 8);
    }

    #[test]
    fn test_octave_weights_sum_geometrically() {
        let source = NoiseHeightSource::with_octaves(2, 3, 10.0);
        assert_eq!(source.norm, 1.75);
        assert_eq!(NoiseHeightSource::with_octaves(2, 0, 10.0).norm, 1.0);
    }

    #[test]
    fn test_neighbouring_directions_are_continuous() {
        let source = NoiseHeightSource::with_octaves(9, 4, 1000.0);
        let dir = DVec3::new(1.0, 0.2, 0.1).normalize();
        let near = (dir + DVec3::new(0.0, 1e-6, 0.0)).normalize();
        assert!((source.height(dir) - source.height(near)).abs() < 1.0);
    }

    #[test]
    fn test_constant_source() {
        let source = ConstantHeightSource(12.5);
        assert_eq!(source.height(DVec3::X), 12.5);
        assert_eq!(source.height(DVec3::NEG_Z), 12.5);
    }
}
