//! Rapier colliders built from planet surface patches.

use glam::DVec3;
use rapier3d::parry::shape::TriMeshBuilderError;
use rapier3d::prelude::*;

use crate::callback::TriangleCollector;
use crate::planet_shape::PlanetShape;

/// Friction of planet surface patches.
pub const SURFACE_FRICTION: f32 = 0.7;

/// Errors raised while building a surface patch collider.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("failed to build surface trimesh: {0}")]
    TriMesh(#[from] TriMeshBuilderError),
}

/// Builds a static trimesh collider for the surface under the local-frame box
/// `[aabb_min, aabb_max]`.
///
/// Vertices are stored relative to the box center so they keep single-precision
/// accuracy on large planets; the collider is translated to the planet center
/// plus the box center. Returns `None` when the shape emits nothing.
pub fn patch_collider(
    shape: &PlanetShape,
    aabb_min: DVec3,
    aabb_max: DVec3,
) -> Result<Option<Collider>, PatchError> {
    let mut collector = TriangleCollector::new();
    shape.process_all_triangles(&mut collector, aabb_min, aabb_max);
    if collector.is_empty() {
        return Ok(None);
    }

    let anchor = (aabb_min + aabb_max) * 0.5;
    let vertices: Vec<Vector> = collector
        .vertices()
        .map(|v| {
            let local = (v - anchor).as_vec3();
            Vector::new(local.x, local.y, local.z)
        })
        .collect();
    let indices: Vec<[u32; 3]> = (0..collector.len() as u32)
        .map(|t| [3 * t, 3 * t + 1, 3 * t + 2])
        .collect();

    let origin = (shape.center() + anchor).as_vec3();
    let collider = ColliderBuilder::trimesh(vertices, indices)?
        .translation(Vector::new(origin.x, origin.y, origin.z))
        .friction(SURFACE_FRICTION)
        .restitution(0.0)
        .build();
    Ok(Some(collider))
}
