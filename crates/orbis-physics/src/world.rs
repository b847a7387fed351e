//! A rapier world around one planet.
//!
//! The planet is never a single collider. Each tracked body gets its own surface
//! patch from [`PlanetShape`], rebuilt only when the body leaves the box the patch
//! was generated for. Gravity pulls every dynamic body toward the planet center.

use glam::{DVec3, Vec3};
use rapier3d::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::patch_collider::{PatchError, patch_collider};
use crate::planet_shape::PlanetShape;

/// Padding added around a body's extent when a patch is generated.
const PATCH_MARGIN: f64 = 4.0;

/// Surface patch kept for one tracked body.
#[derive(Clone, Copy, Debug)]
struct SurfacePatch {
    /// Half-size of the body's bounding cube.
    half_extent: f64,
    /// Query box of the current patch, in the planet's local frame.
    query_min: DVec3,
    query_max: DVec3,
    collider: Option<ColliderHandle>,
}

impl SurfacePatch {
    fn contains(&self, position: DVec3) -> bool {
        let e = DVec3::splat(self.half_extent);
        (position - e).cmpge(self.query_min).all() && (position + e).cmple(self.query_max).all()
    }
}

/// Simulation state for bodies moving over a planet surface.
pub struct PlanetPhysicsWorld {
    pub planet: PlanetShape,
    /// Acceleration toward the planet center in m/s².
    pub surface_gravity: f32,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    patches: FxHashMap<RigidBodyHandle, SurfacePatch>,
}

impl PlanetPhysicsWorld {
    /// Creates an empty world stepping at 60 Hz.
    pub fn new(planet: PlanetShape, surface_gravity: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: 1.0 / 60.0,
            ..Default::default()
        };

        Self {
            planet,
            surface_gravity,
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            patches: FxHashMap::default(),
        }
    }

    /// Spawns a dynamic ball at `position` and tracks it.
    pub fn spawn_ball(&mut self, position: Vec3, radius: f32) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(Vector::new(position.x, position.y, position.z))
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::ball(radius).friction(0.7).build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.track_body(handle, f64::from(radius));
        handle
    }

    /// Starts generating surface patches for an existing body whose colliders fit
    /// in a cube of half-size `half_extent` around its origin.
    pub fn track_body(&mut self, handle: RigidBodyHandle, half_extent: f64) {
        self.patches.insert(
            handle,
            SurfacePatch {
                half_extent,
                query_min: DVec3::ZERO,
                query_max: DVec3::ZERO,
                collider: None,
            },
        );
    }

    /// Stops tracking `handle` and removes its surface patch.
    pub fn untrack_body(&mut self, handle: RigidBodyHandle) {
        if let Some(patch) = self.patches.remove(&handle) {
            self.remove_patch_collider(patch.collider);
        }
    }

    /// Number of live surface patch colliders.
    pub fn patch_count(&self) -> usize {
        self.patches.values().filter(|p| p.collider.is_some()).count()
    }

    pub fn body_position(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|body| {
            let t = body.translation();
            Vec3::new(t.x, t.y, t.z)
        })
    }

    /// Applies planet gravity, refreshes surface patches, then advances the
    /// simulation by one timestep.
    pub fn step(&mut self) -> Result<(), PatchError> {
        self.apply_planet_gravity();
        self.refresh_patches()?;

        self.physics_pipeline.step(
            Vector::new(0.0, 0.0, 0.0),
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        Ok(())
    }

    fn apply_planet_gravity(&mut self) {
        let center = self.planet.native_center();
        for (_, body) in self.rigid_body_set.iter_mut() {
            if !body.is_dynamic() {
                continue;
            }
            let t = body.translation();
            let down = (center - Vec3::new(t.x, t.y, t.z)).normalize_or_zero();
            let force = down * self.surface_gravity * body.mass();
            body.reset_forces(false);
            body.add_force(Vector::new(force.x, force.y, force.z), true);
        }
    }

    fn refresh_patches(&mut self) -> Result<(), PatchError> {
        let center = self.planet.center();
        let mut stale = Vec::new();

        for (&handle, patch) in self.patches.iter_mut() {
            let Some(body) = self.rigid_body_set.get(handle) else {
                stale.push(handle);
                continue;
            };
            let t = body.translation();
            let local = DVec3::new(f64::from(t.x), f64::from(t.y), f64::from(t.z)) - center;
            if patch.collider.is_some() && patch.contains(local) {
                continue;
            }

            let pad = DVec3::splat(patch.half_extent + PATCH_MARGIN);
            patch.query_min = local - pad;
            patch.query_max = local + pad;

            if let Some(old) = patch.collider.take() {
                self.collider_set
                    .remove(old, &mut self.island_manager, &mut self.rigid_body_set, true);
            }
            if let Some(collider) = patch_collider(&self.planet, patch.query_min, patch.query_max)? {
                patch.collider = Some(self.collider_set.insert(collider));
            }
            trace!(?handle, ?local, "Rebuilt surface patch");
        }

        for handle in stale {
            debug!(?handle, "Dropping surface patch of removed body");
            self.untrack_body(handle);
        }
        Ok(())
    }

    fn remove_patch_collider(&mut self, collider: Option<ColliderHandle>) {
        if let Some(handle) = collider {
            self.collider_set.remove(
                handle,
                &mut self.island_manager,
                &mut self.rigid_body_set,
                true,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_terrain::ConstantHeightSource;
    use std::sync::Arc;

    fn small_planet() -> PlanetPhysicsWorld {
        let shape = PlanetShape::new(DVec3::ZERO, 100.0, Arc::new(ConstantHeightSource(0.0)));
        PlanetPhysicsWorld::new(shape, 9.81)
    }

    #[test]
    fn test_world_initializes_empty() {
        let world = small_planet();
        assert_eq!(world.rigid_body_set.len(), 0);
        assert_eq!(world.collider_set.len(), 0);
        assert_eq!(world.patch_count(), 0);
    }

    #[test]
    fn test_ball_comes_to_rest_on_surface() {
        let mut world = small_planet();
        let ball = world.spawn_ball(Vec3::new(0.0, 103.0, 0.0), 0.5);

        for _ in 0..240 {
            world.step().unwrap();
        }

        let p = world.body_position(ball).unwrap();
        assert!(p.y > 99.5 && p.y < 101.0, "ball should rest on the surface, y={}", p.y);
        assert!(p.x.abs() < 1.0 && p.z.abs() < 1.0, "ball drifted: {p:?}");
        assert_eq!(world.patch_count(), 1);
    }

    #[test]
    fn test_gravity_points_to_planet_center() {
        let mut world = small_planet();
        let ball = world.spawn_ball(Vec3::new(130.0, 0.0, 0.0), 0.5);

        for _ in 0..30 {
            world.step().unwrap();
        }

        let p = world.body_position(ball).unwrap();
        assert!(p.x < 130.0, "ball should fall toward -x, x={}", p.x);
        assert!(p.y.abs() < 1e-3 && p.z.abs() < 1e-3, "{p:?}");
    }

    #[test]
    fn test_patch_rebuilt_when_body_leaves_query() {
        let mut world = small_planet();
        let ball = world.spawn_ball(Vec3::new(0.0, 150.0, 0.0), 0.5);
        world.step().unwrap();
        assert_eq!(world.patch_count(), 1);

        if let Some(body) = world.rigid_body_set.get_mut(ball) {
            body.set_translation(Vector::new(0.0, 0.0, 150.0), true);
        }
        world.step().unwrap();
        assert_eq!(world.patch_count(), 1);
        // Ball and one patch collider.
        assert_eq!(world.collider_set.len(), 2);
    }

    #[test]
    fn test_removed_body_drops_its_patch() {
        let mut world = small_planet();
        let ball = world.spawn_ball(Vec3::new(0.0, 102.0, 0.0), 0.5);
        world.step().unwrap();
        world.rigid_body_set.remove(
            ball,
            &mut world.island_manager,
            &mut world.collider_set,
            &mut world.impulse_joint_set,
            &mut world.multibody_joint_set,
            true,
        );
        world.step().unwrap();
        assert_eq!(world.patch_count(), 0);
        assert_eq!(world.collider_set.len(), 0);
    }
}
