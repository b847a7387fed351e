//! Collision geometry for a height-displaced sphere.
//!
//! A planet is far too large to triangulate up front, so [`PlanetShape`] answers
//! each broad-phase query box with a small patch: the eight box corners are
//! projected onto the terrain surface and the three box faces nearest the planet
//! center are triangulated. Every query costs eight height samples and yields at
//! most six triangles.

use std::sync::Arc;

use glam::{DVec3, Vec3};
use orbis_config::PlanetParameters;
use orbis_terrain::{HeightDataSource, NoiseHeightSource};
use tracing::trace;

use crate::callback::TriangleCallback;

/// Corner indices of each box face, wound consistently. Corner `i` takes the
/// max coordinate on x when bit 0 is set, on y for bit 1, on z for bit 2.
const LEFT: [usize; 4] = [0, 4, 6, 2];
const RIGHT: [usize; 4] = [1, 3, 7, 5];
const BOTTOM: [usize; 4] = [0, 1, 5, 4];
const TOP: [usize; 4] = [2, 6, 7, 3];
const FRONT: [usize; 4] = [0, 2, 3, 1];
const BACK: [usize; 4] = [4, 5, 7, 6];

/// Opposing face pairs, min side first.
const FACE_PAIRS: [([usize; 4], [usize; 4]); 3] = [(LEFT, RIGHT), (BOTTOM, TOP), (FRONT, BACK)];

/// Maximum triangles a single query can emit.
pub const MAX_PATCH_TRIANGLES: usize = 6;

/// A planet as a static collision shape.
///
/// The center is single-writer: move it with [`set_center`](Self::set_center)
/// from the simulation thread, never concurrently with queries.
#[derive(Clone)]
pub struct PlanetShape {
    center: DVec3,
    native_center: Vec3,
    radius: f64,
    source: Arc<dyn HeightDataSource>,
}

impl PlanetShape {
    /// # Panics
    ///
    /// Panics if `radius` is not strictly positive.
    pub fn new(center: DVec3, radius: f64, source: Arc<dyn HeightDataSource>) -> Self {
        assert!(radius > 0.0, "planet radius must be positive, got {radius}");
        Self {
            center,
            native_center: center.as_vec3(),
            radius,
            source,
        }
    }

    /// A shape at the origin using the planet's radius and its noise terrain.
    pub fn from_parameters(params: &PlanetParameters) -> Self {
        Self::new(
            DVec3::ZERO,
            params.radius,
            Arc::new(NoiseHeightSource::new(params)),
        )
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// The center in the physics engine's single-precision frame.
    pub fn native_center(&self) -> Vec3 {
        self.native_center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn source(&self) -> &Arc<dyn HeightDataSource> {
        &self.source
    }

    /// Moves the planet. Updates both the logical and the native center.
    pub fn set_center(&mut self, center: DVec3) {
        self.center = center;
        self.native_center = center.as_vec3();
    }

    /// `[center - radius, center + radius]` on every axis.
    ///
    /// Terrain above the base radius is not included.
    pub fn bounding_box(&self) -> (DVec3, DVec3) {
        let extent = DVec3::splat(self.radius);
        (self.center - extent, self.center + extent)
    }

    /// Static shape: contributes no inertia for any mass.
    pub fn calculate_local_inertia(&self, _mass: f64) -> DVec3 {
        DVec3::ZERO
    }

    /// Surface point for `corner`, relative to the center.
    fn project(&self, corner: DVec3) -> DVec3 {
        let direction = (corner - self.center).normalize_or_zero();
        direction * (self.radius + self.source.height(direction))
    }

    /// Emits the surface patch under the local-frame box `[aabb_min, aabb_max]`
    /// and returns how many triangles were emitted.
    ///
    /// For each axis only the face whose midpoint is nearer the center is
    /// triangulated (ties go to the min side), so the result never exceeds
    /// [`MAX_PATCH_TRIANGLES`]. Vertices are relative to the center. The box is
    /// not validated: an empty or inverted box still produces triangles.
    pub fn process_all_triangles(
        &self,
        callback: &mut dyn TriangleCallback,
        aabb_min: DVec3,
        aabb_max: DVec3,
    ) -> usize {
        let min = aabb_min + self.center;
        let max = aabb_max + self.center;

        let corners: [DVec3; 8] = std::array::from_fn(|i| {
            DVec3::new(
                if i & 1 != 0 { max.x } else { min.x },
                if i & 2 != 0 { max.y } else { min.y },
                if i & 4 != 0 { max.z } else { min.z },
            )
        });
        let vertices = corners.map(|corner| self.project(corner));

        let mut emitted = 0;
        for (near, far) in FACE_PAIRS {
            let face = if self.face_distance(&corners, near) <= self.face_distance(&corners, far) {
                near
            } else {
                far
            };
            let [a, b, c, d] = face.map(|i| vertices[i]);
            callback.process_triangle(&[a, b, c], 0, 0);
            callback.process_triangle(&[a, c, d], 0, 0);
            emitted += 2;
        }

        trace!(?aabb_min, ?aabb_max, emitted, "Generated planet collision patch");
        emitted
    }

    fn face_distance(&self, corners: &[DVec3; 8], face: [usize; 4]) -> f64 {
        let midpoint = face.iter().map(|&i| corners[i]).sum::<DVec3>() / 4.0;
        midpoint.distance_squared(self.center)
    }
}

impl std::fmt::Debug for PlanetShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanetShape")
            .field("center", &self.center)
            .field("radius", &self.radius)
            .finish_non_exhaustive()
    }
}
