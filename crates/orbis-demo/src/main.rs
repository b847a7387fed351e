//! Generates a planet's surface maps and probes its collision surface.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p orbis-demo -- --biome mars-like --seed 7 --output out/mars`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use glam::{DVec3, Vec3};
use orbis_config::{CliArgs, Config, ConfigError};
use orbis_parallel::ParallelForExecutor;
use orbis_physics::{
    PatchError, PlanetPhysicsWorld, PlanetShape, TriangleCollector, patch_collider,
};
use orbis_terrain::{
    CoverageDomain, HeightDataSource, MapError, NoiseHeightSource, PaletteError, SurfaceMaps,
    TerrainPalette, biome_for,
};
use tracing::{error, info};

/// Samples per axis when checking palette coverage at startup.
const COVERAGE_STEPS: usize = 12;
/// Half-size of the collision probe boxes in meters.
const PROBE_HALF_EXTENT: f64 = 10.0;
/// Fixed steps simulated for the drop test (four seconds at 60 Hz).
const DROP_STEPS: usize = 240;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Patch(#[from] PatchError),
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(Config::default_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    orbis_log::init_logging(
        Some(&log_dir),
        cfg!(debug_assertions) || config.debug.log_to_file,
        Some(&config),
    );

    match run(&config, &args.output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "Planet generation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, output: &std::path::Path) -> Result<(), DemoError> {
    let planet = &config.planet;
    planet.validate()?;
    info!(
        biome = ?config.biome,
        seed = planet.seed,
        radius = planet.radius,
        height_scale = planet.height_scale,
        "Generating planet"
    );

    let executor = ParallelForExecutor::from_config(&config.parallel);

    let biome = biome_for(config.biome);
    let palette = TerrainPalette::new(planet, biome.as_ref())?;
    palette.check_coverage(
        &CoverageDomain::for_planet(planet, &config.map),
        COVERAGE_STEPS,
    )?;

    let source: Arc<dyn HeightDataSource> = Arc::new(NoiseHeightSource::new(planet));

    let started = Instant::now();
    let maps = SurfaceMaps::generate(&palette, source.as_ref(), &config.map, &executor)?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        threads = executor.parallelism(),
        multicore = executor.is_multicore(),
        "Surface maps ready"
    );
    maps.save_png(output)?;

    let shape = PlanetShape::new(DVec3::ZERO, planet.radius, Arc::clone(&source));
    probe_collision(&shape)?;
    drop_test(shape)?;
    Ok(())
}

/// Queries small boxes straddling the surface along the six axes.
fn probe_collision(shape: &PlanetShape) -> Result<(), DemoError> {
    let half = DVec3::splat(PROBE_HALF_EXTENT);
    for axis in [DVec3::X, DVec3::NEG_X, DVec3::Y, DVec3::NEG_Y, DVec3::Z, DVec3::NEG_Z] {
        let surface = axis * (shape.radius() + shape.source().height(axis));
        let mut collector = TriangleCollector::new();
        let emitted = shape.process_all_triangles(&mut collector, surface - half, surface + half);
        let altitude_range = collector
            .vertices()
            .map(|v| v.length() - shape.radius())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), h| (lo.min(h), hi.max(h)));

        let collider = patch_collider(shape, surface - half, surface + half)?;
        info!(
            ?axis,
            emitted,
            min_altitude = altitude_range.0,
            max_altitude = altitude_range.1,
            collider = collider.is_some(),
            "Collision probe"
        );
    }
    Ok(())
}

/// Drops a ball onto the north pole with the planet re-centered so the pole sits
/// near the physics origin.
fn drop_test(mut shape: PlanetShape) -> Result<(), DemoError> {
    let pole_height = shape.source().height(DVec3::Y);
    shape.set_center(DVec3::new(0.0, -(shape.radius() + pole_height), 0.0));

    let mut world = PlanetPhysicsWorld::new(shape, 9.81);
    let ball = world.spawn_ball(Vec3::new(0.0, 5.0, 0.0), 0.5);
    for _ in 0..DROP_STEPS {
        world.step()?;
    }

    if let Some(position) = world.body_position(ball) {
        info!(
            final_height = position.y,
            patches = world.patch_count(),
            "Drop test finished"
        );
    }
    Ok(())
}
